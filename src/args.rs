use gumdrop::Options;

/// Listen for push webhooks and run the benchmark build on new commits.
#[derive(Debug, Options)]
pub struct Args {
    /// The git repository to build the benchmark from.
    #[options(free)]
    pub directory: Option<String>,

    /// The address to listen on for webhooks.
    #[options(no_short, default = "0.0.0.0:80")]
    pub listen: String,

    /// The reference to react to, pushes to anything else are ignored.
    #[options(no_short, default = "refs/heads/main")]
    pub branch: String,

    /// The zig binary to build the benchmark with.
    #[options(no_short, default = "zig")]
    pub zig: String,

    /// Only print error messages.
    #[options()]
    pub quiet: bool,

    /// Increase verbosity, can be set multiple times (-v debug, -vv tracing)
    #[options(count)]
    pub verbose: u8,

    /// Print the current version.
    #[options(short = "V")]
    pub version: bool,

    /// Print this help.
    #[options()]
    pub help: bool,
}

pub fn parse_args() -> Args {
    Args::parse_args_default_or_exit()
}
