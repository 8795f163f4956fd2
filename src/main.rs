use benchhook::{
    args::{parse_args, Args},
    builder::zig::ZigBuilder,
    handler::Handler,
    logger::init_logger,
    repository::git::GitRepository,
    server::WebhookServer,
    MainError,
};
use std::process;

fn run(args: Args) -> Result<(), MainError> {
    init_logger(&args)?;

    // Setup the shared checkout.
    let directory = args.directory.ok_or(MainError::MissingDirectory)?;
    let repository = GitRepository::open(&directory)?;

    // Setup the benchmark build.
    let builder = ZigBuilder::new(directory, args.zig);

    // Serve until terminated.
    let handler = Handler::new(repository, builder, args.branch);
    let server = WebhookServer::new(args.listen, handler);
    server.serve()?;

    Ok(())
}

fn main() {
    let args = parse_args();

    if args.version {
        println!("benchhook {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    match run(args) {
        Ok(()) => (),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
