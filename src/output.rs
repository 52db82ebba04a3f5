use crate::error::LoggerError;
use crate::sampler::SampleLog;
use log::info;
use std::path::Path;

/// Default output file, next to the working directory.
pub const OUTPUT_FILE: &str = "data_logger_output.csv";

/// Write the accumulated samples as CSV.
///
/// Layout: header `Timestamp,Elapsed Time [s],<channels...>`, then one row
/// per sample with the timestamp formatted to the second, elapsed time to
/// 3 decimals and voltages to 5, in the run's channel order. Only called
/// after the sampling loop has finished; a failed run writes nothing.
pub fn write_csv(path: &Path, log: &SampleLog) -> Result<(), LoggerError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["Timestamp".to_string(), "Elapsed Time [s]".to_string()];
    header.extend(log.channels.iter().map(|ch| ch.label().to_string()));
    writer.write_record(&header)?;

    for i in 0..log.len() {
        let mut row = Vec::with_capacity(header.len());
        row.push(log.timestamps[i].format("%Y-%m-%d %H:%M:%S").to_string());
        row.push(format!("{:.3}", log.elapsed[i]));
        for readings in &log.readings {
            row.push(format!("{:.5}", readings[i]));
        }
        writer.write_record(&row)?;
    }

    writer.flush().map_err(|source| LoggerError::Io {
        source,
        context: format!("Failed to flush CSV to {}", path.display()),
    })?;

    info!("Wrote {} samples to {}", log.len(), path.display());
    Ok(())
}
