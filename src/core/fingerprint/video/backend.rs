//! Video decoding backends.
//!
//! A backend can probe a container for its stream properties and hand back
//! a single decoded grayscale frame by index. The shipped backends shell out
//! to the `ffprobe` and `ffmpeg` executables.

use crate::error::BackendError;
use image::GrayImage;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::trace;

/// Stream properties reported by a probe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Container duration in seconds
    pub duration_secs: Option<f64>,
    /// Average frame rate of the video stream
    pub fps: Option<f64>,
    /// Number of frames, reported or derived from duration and frame rate
    pub frame_count: Option<u64>,
}

impl VideoInfo {
    /// Duration in seconds, derived from frame count when not reported
    pub fn effective_duration(&self) -> Option<f64> {
        match (self.frame_count, self.fps) {
            (Some(frames), Some(fps)) if fps > 0.0 => Some(frames as f64 / fps),
            _ => self.duration_secs,
        }
    }
}

/// A decoder able to read individual frames from a video file
pub trait VideoBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Read stream properties; failure means the backend cannot open the file
    fn probe(&self, path: &Path) -> Result<VideoInfo, BackendError>;

    /// Decode frame `index` as an 8-bit grayscale image
    fn read_frame(&self, path: &Path, info: &VideoInfo, index: u64)
        -> Result<GrayImage, BackendError>;
}

/// Decoding flavours of the ffmpeg backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfmpegFlavor {
    /// Plain ffmpeg with default demuxer settings
    Standard,
    /// Larger analyze duration and probe size, for streams with late headers
    DeepProbe,
    /// Ignore decode errors and drop corrupt packets
    Tolerant,
}

/// Backend that drives the ffprobe and ffmpeg command line tools
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    flavor: FfmpegFlavor,
    ffprobe: String,
    ffmpeg: String,
}

impl FfmpegBackend {
    pub fn new(flavor: FfmpegFlavor) -> Self {
        Self {
            flavor,
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }

    /// Use specific executables instead of looking them up on PATH
    pub fn with_executables(mut self, ffprobe: impl Into<String>, ffmpeg: impl Into<String>) -> Self {
        self.ffprobe = ffprobe.into();
        self.ffmpeg = ffmpeg.into();
        self
    }

    /// Default backend followed by the fallbacks, in the order they are tried
    pub fn chain() -> Vec<Box<dyn VideoBackend>> {
        vec![
            Box::new(Self::new(FfmpegFlavor::Standard)),
            Box::new(Self::new(FfmpegFlavor::DeepProbe)),
            Box::new(Self::new(FfmpegFlavor::Tolerant)),
        ]
    }

    fn input_args(&self) -> &'static [&'static str] {
        match self.flavor {
            FfmpegFlavor::Standard => &[],
            FfmpegFlavor::DeepProbe => &["-analyzeduration", "100M", "-probesize", "100M"],
            FfmpegFlavor::Tolerant => &["-err_detect", "ignore_err", "-fflags", "+discardcorrupt"],
        }
    }

    fn run(&self, tool: &str, command: &mut Command) -> Result<Output, BackendError> {
        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| BackendError::Launch {
                tool: tool.to_string(),
                source,
            })?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(BackendError::ToolFailed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl VideoBackend for FfmpegBackend {
    fn name(&self) -> &str {
        match self.flavor {
            FfmpegFlavor::Standard => "ffmpeg",
            FfmpegFlavor::DeepProbe => "ffmpeg-deep-probe",
            FfmpegFlavor::Tolerant => "ffmpeg-tolerant",
        }
    }

    fn probe(&self, path: &Path) -> Result<VideoInfo, BackendError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "error"])
            .args(self.input_args())
            .args([
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,avg_frame_rate,nb_frames:format=duration",
                "-of",
                "default=noprint_wrappers=1",
            ])
            .arg(path);

        let output = self.run(&self.ffprobe, &mut command)?;
        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn read_frame(
        &self,
        path: &Path,
        info: &VideoInfo,
        index: u64,
    ) -> Result<GrayImage, BackendError> {
        let fps = info.fps.filter(|fps| *fps > 0.0).unwrap_or(30.0);
        let timestamp = format!("{:.3}", index as f64 / fps);
        trace!(path = %path.display(), index, %timestamp, backend = self.name(), "reading frame");

        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-v", "error", "-nostdin"])
            .args(self.input_args())
            .args(["-ss", &timestamp, "-i"])
            .arg(path)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "gray", "-"]);

        let output = self.run(&self.ffmpeg, &mut command)?;
        let expected = info.width as usize * info.height as usize;
        if output.stdout.len() != expected || expected == 0 {
            return Err(BackendError::InvalidOutput(format!(
                "frame {} has {} bytes, expected {}",
                index,
                output.stdout.len(),
                expected
            )));
        }

        GrayImage::from_raw(info.width, info.height, output.stdout).ok_or_else(|| {
            BackendError::InvalidOutput(format!("frame {} does not fit {}x{}", index, info.width, info.height))
        })
    }
}

/// Parse ffprobe `key=value` output into stream properties.
///
/// Unknown keys are ignored and `N/A` values are treated as missing. Width
/// and height are required.
pub fn parse_probe_output(output: &str) -> Result<VideoInfo, BackendError> {
    let mut width = None;
    let mut height = None;
    let mut info = VideoInfo::default();

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        if value == "N/A" {
            continue;
        }

        match key {
            "width" => width = value.parse().ok(),
            "height" => height = value.parse().ok(),
            "avg_frame_rate" => info.fps = parse_rate(value),
            "nb_frames" => info.frame_count = value.parse().ok(),
            "duration" => info.duration_secs = value.parse().ok(),
            _ => {}
        }
    }

    info.width = width.ok_or_else(|| BackendError::InvalidOutput("missing width".to_string()))?;
    info.height =
        height.ok_or_else(|| BackendError::InvalidOutput("missing height".to_string()))?;

    if info.frame_count.is_none() {
        if let (Some(duration), Some(fps)) = (info.duration_secs, info.fps) {
            info.frame_count = Some((duration * fps).round() as u64);
        }
    }

    Ok(info)
}

/// Parse a rational frame rate like `30000/1001`
fn parse_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num.parse::<f64>().ok()? / den
        }
        None => value.parse().ok()?,
    };
    (rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_probe_output() {
        let output = "width=1920\nheight=1080\navg_frame_rate=30/1\nnb_frames=900\nduration=30.000000\n";
        let info = parse_probe_output(output).unwrap();

        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.fps, Some(30.0));
        assert_eq!(info.frame_count, Some(900));
        assert_eq!(info.duration_secs, Some(30.0));
    }

    #[test]
    fn frame_count_derived_when_missing() {
        let output = "width=640\r\nheight=480\r\navg_frame_rate=25/1\r\nnb_frames=N/A\r\nduration=10.0\r\n";
        let info = parse_probe_output(output).unwrap();
        assert_eq!(info.frame_count, Some(250));
    }

    #[test]
    fn ntsc_rate_is_parsed() {
        let info = parse_probe_output("width=1\nheight=1\navg_frame_rate=30000/1001\n").unwrap();
        let fps = info.fps.unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn zero_rate_is_unknown() {
        let info = parse_probe_output("width=1\nheight=1\navg_frame_rate=0/0\n").unwrap();
        assert_eq!(info.fps, None);
        assert_eq!(info.frame_count, None);
    }

    #[test]
    fn missing_dimensions_are_rejected() {
        assert!(parse_probe_output("height=1080\n").is_err());
        assert!(parse_probe_output("").is_err());
    }

    #[test]
    fn effective_duration_prefers_frame_count() {
        let info = VideoInfo {
            duration_secs: Some(99.0),
            fps: Some(10.0),
            frame_count: Some(50),
            ..Default::default()
        };
        assert_eq!(info.effective_duration(), Some(5.0));
    }

    #[test]
    fn chain_order_is_fixed() {
        let names: Vec<_> = FfmpegBackend::chain()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["ffmpeg", "ffmpeg-deep-probe", "ffmpeg-tolerant"]);
    }

    #[test]
    fn missing_executable_is_launch_error() {
        let backend = FfmpegBackend::new(FfmpegFlavor::Standard)
            .with_executables("/nonexistent/ffprobe-xyz", "/nonexistent/ffmpeg-xyz");
        let result = backend.probe(Path::new("clip.mp4"));
        assert!(matches!(result, Err(BackendError::Launch { .. })));
    }
}
