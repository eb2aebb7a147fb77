use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use once_cell::sync::OnceCell;

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Initializes the logging system.
///
/// This function sets up the logger based on a configuration file.
/// It should be called once at the beginning of the application's execution.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file("log4rs.yaml", Default::default())?;
    let _ = INITIALIZED.set(());
    Ok(())
}

/// Console plus a per-database log file under `logs/`. Repeat calls, and
/// calls after `init`, are a no-op.
pub fn init_for_db(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d} {l} {t} - {m}{n}")))
        .build(format!("logs/{name}.log"))?;
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(console)))
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(LevelFilter::Info),
        )?;
    log4rs::init_config(config)?;
    let _ = INITIALIZED.set(());
    Ok(())
}
