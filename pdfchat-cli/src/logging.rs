use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a stderr log subscriber.
///
/// `RUST_LOG` wins when set and `verbose` is zero. Errors are ignored so a
/// second initialisation (e.g. in tests) never aborts the program.
pub fn init_logging(verbose: u8) {
    let _ = try_init_logging(verbose);
}

fn try_init_logging(verbose: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) if verbose == 0 => filter,
        _ => EnvFilter::try_new(default_directives(verbose))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}

/// Filter directives for a given `-v` count.
pub fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,pdfchat_rag=info,pdfchat_cli=info",
        1 => "warn,pdfchat_rag=debug,pdfchat_cli=debug",
        _ => "debug",
    }
}
