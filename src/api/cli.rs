use clap::Parser;

pub struct Cli;

impl Cli {
    pub fn run(&self) -> CliProgram {
        CliProgram::parse()
    }
}

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliProgram {
    #[arg(
        long,
        short,
        value_name = "FILE_PATH",
        help = "Custom path to config file"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        short,
        value_name = "FILE_PATH",
        help = "File the bookmark links are collected in (default: bookmarks.txt)"
    )]
    pub output_file: Option<String>,

    #[arg(
        long,
        short,
        value_name = "SECONDS",
        help = "Delay between remove requests (default: 2.0)"
    )]
    pub delay_between_requests: Option<f64>,

    #[arg(
        long,
        short,
        value_name = "MODE",
        help = "How new links go into the file: a (append), p (prepend) or ask (default: a)"
    )]
    pub mode: Option<String>,

    #[arg(
        short,
        long,
        help = "Stop after a single fetch-and-clear pass (default: false)",
        default_value_t = false
    )]
    pub single_run: bool,

    #[arg(
        long,
        value_name = "COUNT",
        help = "Maximum number of passes before giving up (default: 100)"
    )]
    pub max_runs: Option<usize>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Delay between passes (default: 1.0)"
    )]
    pub delay_between_runs: Option<f64>,

    #[arg(
        long,
        help = "Skip links that are already present in the output file",
        default_value_t = false
    )]
    pub dedupe_history: bool,
}
