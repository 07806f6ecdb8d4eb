use crate::{CollectorError, ResultTable, TableSink};
use std::path::{Path, PathBuf};

/// Comma separated file with a header row. Overwrites `path`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

pub fn write_table<W: std::io::Write>(table: &ResultTable, writer: W) -> Result<(), CollectorError> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(table.header())?;
    for row in table.rows() {
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}

#[async_trait::async_trait]
impl TableSink for CsvSink {
    async fn write(&self, table: &ResultTable) -> Result<(), CollectorError> {
        let file = std::fs::File::create(&self.path)?;
        write_table(table, file)
    }
}
