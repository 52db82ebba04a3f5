use crate::sampler::SampleLog;
use rgb::RGB8;
use textplots::{Chart, ColorPlot, Shape};

/// Fixed palette cycled by channel index when a run logs more channels
/// than there are colors.
const PALETTE: [(RGB8, &str); 4] = [
    (RGB8 { r: 255, g: 215, b: 0 }, "gold"),
    (RGB8 { r: 255, g: 0, b: 255 }, "magenta"),
    (RGB8 { r: 0, g: 255, b: 255 }, "cyan"),
    (RGB8 { r: 50, g: 205, b: 50 }, "limegreen"),
];

/// Render one line series per logged channel: elapsed time on the x-axis,
/// voltage on the y-axis.
///
/// Blocking terminal output, only invoked after collection and CSV writing
/// are complete.
///
/// # Arguments
/// * `log` - The completed run to plot
/// * `width` - Optional plot width (default: 140)
/// * `height` - Optional plot height (default: 60)
pub fn plot_time_series(
    log: &SampleLog,
    width: Option<usize>,
    height: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if log.is_empty() {
        return Err("Cannot plot empty data".into());
    }

    let width = width.unwrap_or(140);
    let height = height.unwrap_or(60);

    let frames: Vec<Vec<(f32, f32)>> = log
        .readings
        .iter()
        .map(|series| {
            log.elapsed
                .iter()
                .zip(series)
                .map(|(&t, &v)| (t as f32, v as f32))
                .collect()
        })
        .collect();
    let shapes: Vec<Shape> = frames.iter().map(|f| Shape::Lines(f.as_slice())).collect();

    let max_time = log.elapsed.last().copied().unwrap_or(0.0) as f32;

    println!("Data Logger");
    println!("X-axis: Time [s] | Y-axis: Voltage [V]");
    for (idx, channel) in log.channels.iter().enumerate() {
        println!("{channel}: {}", PALETTE[idx % PALETTE.len()].1);
    }
    println!("{}", "─".repeat(width));

    let mut chart = Chart::new(width as u32, height as u32, 0.0, max_time.max(f32::EPSILON));
    let mut view = &mut chart;
    for (idx, shape) in shapes.iter().enumerate() {
        view = view.linecolorplot(shape, PALETTE[idx % PALETTE.len()].0);
    }
    view.nice();

    println!("Time [s] →");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RunOutcome, ScopeChannel};
    use chrono::Local;

    fn log_with_channels(count: usize) -> SampleLog {
        let now = Local::now();
        let channels = ScopeChannel::ALL[..count].to_vec();
        SampleLog {
            channels,
            timestamps: vec![now; 4],
            elapsed: vec![0.0, 1.0, 2.0, 3.0],
            readings: (0..count)
                .map(|i| vec![i as f64, 1.0, -0.5, 2.0])
                .collect(),
            outcome: RunOutcome::Completed,
        }
    }

    #[test]
    fn plots_single_channel() {
        assert!(plot_time_series(&log_with_channels(1), None, None).is_ok());
    }

    #[test]
    fn plots_all_four_channels() {
        // exercises the full palette
        assert!(plot_time_series(&log_with_channels(4), Some(80), Some(30)).is_ok());
    }

    #[test]
    fn rejects_empty_log() {
        let log = SampleLog {
            channels: vec![ScopeChannel::Ch1],
            timestamps: vec![],
            elapsed: vec![],
            readings: vec![vec![]],
            outcome: RunOutcome::Interrupted,
        };
        assert!(plot_time_series(&log, None, None).is_err());
    }
}
