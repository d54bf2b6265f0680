use clap::Parser;
use clap_complete::Shell;
use jwatch::core::version;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "jwatch",
    author,
    version = version(),
    about = "Streams the console log of a Jenkins job while it runs."
)]
pub struct JWatch {
    /// URL of the job, e.g. https://ci.example.com/job/app/42/console
    #[arg(required_unless_present = "completions")]
    pub url: Option<String>,

    /// Jenkins user name
    #[arg(short, long, env = "JENKINS_USER")]
    pub user: Option<String>,

    /// Jenkins API token
    #[arg(long, env = "JENKINS_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Does not check TLS certs when set
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Pipe the log into this program (e.g. lnav) instead of stdout
    #[arg(long, value_name = "PROGRAM")]
    pub viewer: Option<String>,

    /// Skip the HEAD request that validates the URL and credentials
    #[arg(long)]
    pub no_check: bool,

    #[arg(long, help = "Path to the config file")]
    pub config: Option<PathBuf>,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL", exclusive = true)]
    pub completions: Option<Shell>,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}
