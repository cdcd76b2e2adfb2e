// CSV log rows
//
// The schema has three columns per channel for all eight channels, whether or
// not a sensor is wired there. Each row fills in exactly one channel's three
// columns and leaves the rest empty.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use driver::{AccelSample, Channel};

use crate::error::{SamplerError, SamplerResult};

/// Columns per row
pub const FIELD_COUNT: usize = 24;

/// Column names in file order
pub const HEADER: [&str; FIELD_COUNT] = [
    "AccX0", "AccY0", "AccZ0", "AccX1", "AccY1", "AccZ1", "AccX2", "AccY2", "AccZ2", "AccX3",
    "AccY3", "AccZ3", "AccX4", "AccY4", "AccZ4", "AccX5", "AccY5", "AccZ5", "AccX6", "AccY6",
    "AccZ6", "AccX7", "AccY7", "AccZ7",
];

/// One record: at most one channel's triple is populated
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    fields: [Option<f64>; FIELD_COUNT],
}

impl LogRow {
    fn with_triple(channel: Channel, values: [f64; 3]) -> Self {
        let mut fields = [None; FIELD_COUNT];
        let start = channel.index() as usize * 3;
        for (slot, value) in fields[start..start + 3].iter_mut().zip(values) {
            *slot = Some(value);
        }
        Self { fields }
    }

    /// Row carrying a successful reading for `channel`
    pub fn reading(channel: Channel, sample: &AccelSample) -> Self {
        Self::with_triple(channel, [sample.x, sample.y, sample.z])
    }

    /// Row recording a failed reading for `channel`
    pub fn zeroed(channel: Channel) -> Self {
        Self::with_triple(channel, [0.0; 3])
    }

    pub fn fields(&self) -> &[Option<f64>; FIELD_COUNT] {
        &self.fields
    }

    /// Render as one CSV line without the terminator
    pub fn to_csv(&self) -> String {
        self.fields
            .iter()
            .map(|field| match field {
                Some(value) => format!("{:?}", value),
                None => String::new(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A byte sink that can also push written data to durable storage
pub trait LogSink: Write {
    /// Make everything flushed so far survive a crash
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl LogSink for BufWriter<File> {
    fn sync(&mut self) -> io::Result<()> {
        self.get_ref().sync_data()
    }
}

impl LogSink for Vec<u8> {}

/// Append-only CSV log
pub struct CsvLog<W: LogSink> {
    sink: W,
    path: PathBuf,
    rows: u64,
}

impl CsvLog<BufWriter<File>> {
    /// Create (or truncate) the log file at `path`
    pub fn create(path: impl AsRef<Path>) -> SamplerResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| SamplerError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: LogSink> CsvLog<W> {
    /// Wrap an already open sink; `path` is only used in error messages
    pub fn new(sink: W, path: impl Into<PathBuf>) -> Self {
        Self {
            sink,
            path: path.into(),
            rows: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows appended so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn write_header(&mut self) -> SamplerResult<()> {
        let line = HEADER.join(",");
        self.write_line(&line)
    }

    /// Append `row` and push it to durable storage before returning
    pub fn append(&mut self, row: &LogRow) -> SamplerResult<()> {
        self.write_line(&row.to_csv())?;
        self.rows += 1;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn write_line(&mut self, line: &str) -> SamplerResult<()> {
        writeln!(self.sink, "{}", line)
            .and_then(|_| self.sink.flush())
            .and_then(|_| self.sink.sync())
            .map_err(|e| SamplerError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(index: u8) -> Channel {
        Channel::new(index).unwrap()
    }

    #[test]
    fn test_header_has_fixed_order() {
        assert_eq!(HEADER.len(), FIELD_COUNT);
        for (i, name) in HEADER.iter().enumerate() {
            let axis = ["X", "Y", "Z"][i % 3];
            assert_eq!(*name, format!("Acc{}{}", axis, i / 3));
        }
    }

    #[test]
    fn test_reading_fills_only_its_channel() {
        let row = LogRow::reading(channel(2), &AccelSample::new(1.0, -0.5, 0.25));
        let populated: Vec<usize> = row
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_some())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(populated, vec![6, 7, 8]);
        assert_eq!(row.to_csv(), ",,,,,,1.0,-0.5,0.25,,,,,,,,,,,,,,,");
    }

    #[test]
    fn test_zeroed_row() {
        let row = LogRow::zeroed(channel(7));
        let csv = row.to_csv();
        assert_eq!(csv.split(',').count(), FIELD_COUNT);
        assert!(csv.ends_with("0.0,0.0,0.0"));
    }

    #[test]
    fn test_log_writes_header_and_rows() {
        let mut log = CsvLog::new(Vec::new(), "memory");
        log.write_header().unwrap();
        log.append(&LogRow::zeroed(channel(0))).unwrap();
        assert_eq!(log.rows(), 1);

        let text = String::from_utf8(log.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("AccX0,AccY0,AccZ0,AccX1"));
        assert!(lines[0].ends_with("AccX7,AccY7,AccZ7"));
        assert!(lines[1].starts_with("0.0,0.0,0.0,,"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_rows_are_on_disk_after_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accelerometer.csv");
        let mut log = CsvLog::create(&path).unwrap();
        log.write_header().unwrap();
        log.append(&LogRow::reading(channel(1), &AccelSample::new(0.0, 1.0, 0.0)))
            .unwrap();

        // read while the log is still open: nothing may be held back in a buffer
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(text.lines().nth(1).unwrap(), ",,,0.0,1.0,0.0,,,,,,,,,,,,,,,,,,");
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvLog::create(dir.path().join("missing").join("accelerometer.csv"));
        assert!(matches!(result, Err(SamplerError::Io { .. })));
    }
}
