use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use env_logger::Target;
use log::LevelFilter;

pub const LOG_FILE: &str = "logs.txt";

/// Routes the `log` facade to `<dir>/logs.txt`; the terminal belongs to the UI.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(dir: &Path, level: LevelFilter) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .context("installing logger")?;

    log::debug!("logging to {}", path.display());
    Ok(())
}
