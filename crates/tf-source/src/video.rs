// Décodage vidéo via ffmpeg en subprocess (std::process::Command), sans binding FFI.
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
//   - `probe_video`       : interroge ffprobe pour width/height/fps
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux bgr24 brut sur stdout
//   - `VideoSource`       : lit une frame par appel, synchrone

use anyhow::{Context, Result};
use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use tf_core::config::{FALLBACK_FPS, clamp_fps};
use tf_core::frame::{ChannelOrder, RawFrame};
use tf_core::traits::{FrameRead, RasterSource};

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Parse an ffprobe rate such as `"24/1"` or `"30000/1001"`.
///
/// Returns `None` for zero, negative, or malformed rates.
///
/// # Example
/// ```
/// use tf_source::video::parse_frame_rate;
/// assert_eq!(parse_frame_rate("24/1"), Some(24.0));
/// assert_eq!(parse_frame_rate("0/0"), None);
/// ```
#[must_use]
pub fn parse_frame_rate(val: &str) -> Option<f64> {
    let mut parts = val.trim().splitn(2, '/');
    let num: f64 = parts.next()?.trim().parse().ok()?;
    let den: f64 = match parts.next() {
        Some(d) => d.trim().parse().ok()?,
        None => 1.0,
    };
    let fps = num / den;
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Parse `key=value` lines printed by ffprobe.
///
/// `avg_frame_rate` wins over `r_frame_rate`, which is often the container
/// time base (`90000/1`) on MPEG-TS or variable-rate streams. The result is
/// clamped to `[MIN_FPS, MAX_FPS]`.
///
/// # Errors
/// Returns an error if no width or height is present.
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut r_rate: Option<f64> = None;
    let mut avg_rate: Option<f64> = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            r_rate = parse_frame_rate(val);
        } else if let Some(val) = line.strip_prefix("avg_frame_rate=") {
            avg_rate = parse_frame_rate(val);
        }
    }

    let (Some(width), Some(height)) = (width.filter(|w| *w > 0), height.filter(|h| *h > 0)) else {
        anyhow::bail!("Aucun flux vidéo décodable");
    };
    let fps = match avg_rate.or(r_rate) {
        Some(raw) => {
            let fps = clamp_fps(raw).unwrap_or(FALLBACK_FPS);
            if (fps - raw).abs() > f64::EPSILON {
                log::warn!("Cadence sondée {raw:.3} fps hors bornes, ramenée à {fps:.3}");
            }
            fps
        }
        None => {
            log::warn!("Cadence vidéo inconnue, repli sur {FALLBACK_FPS} fps");
            FALLBACK_FPS
        }
    };
    Ok(VideoInfo { width, height, fps })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// `identifier` may be a path or any URL ffprobe understands.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si la source
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(identifier: &str) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            identifier,
        ])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    if !output.status.success() {
        anyhow::bail!("ffprobe a échoué sur {identifier} ({})", output.status);
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("Source vidéo illisible : {identifier}"))?;
    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({identifier})",
        info.width,
        info.height,
        info.fps
    );
    Ok(info)
}

/// Dimensions de décodage : largeur plafonnée à `max_width`, ratio conservé, côtés pairs.
///
/// # Example
/// ```
/// use tf_source::video::decode_size;
/// assert_eq!(decode_size(1920, 1080, 640), (640, 360));
/// assert_eq!(decode_size(320, 240, 640), (320, 240));
/// ```
#[must_use]
pub fn decode_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let w = (max_width / 2 * 2).max(2);
    let h = (u64::from(height) * u64::from(w) / u64::from(width)) as u32;
    (w, (h / 2 * 2).max(2))
}

/// Lance un processus `ffmpeg` qui écrit des frames BGR brutes sur stdout.
///
/// Chaque frame = `w × h × 3` bytes (row-major, sans padding). `-an` coupe
/// l'audio. Le scale n'est ajouté que si la taille diffère de la native.
///
/// # Errors
/// Returns an error if ffmpeg cannot be spawned.
pub fn spawn_ffmpeg_pipe(identifier: &str, native: (u32, u32), decode: (u32, u32)) -> Result<Child> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error", "-i", identifier]);
    if native != decode {
        cmd.args(["-vf", &format!("scale={}:{}:flags=bilinear", decode.0, decode.1)]);
    }
    cmd.args(["-f", "rawvideo", "-pix_fmt", "bgr24", "-an", "pipe:1"]);

    let child = cmd
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Impossible de lancer ffmpeg. Vérifiez que ffmpeg est installé et dans le PATH.")?;
    log::debug!("ffmpeg spawné: {}x{} depuis {identifier}", decode.0, decode.1);
    Ok(child)
}

/// Résultat d'une lecture de frame sur le pipe.
#[derive(Debug, PartialEq, Eq)]
pub enum PipeRead {
    /// Buffer rempli.
    Full,
    /// EOF avant complétion.
    Eof,
    /// Aucune donnée disponible pour l'instant, rien n'a été consommé.
    Empty,
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// A `WouldBlock` before the first byte is [`PipeRead::Empty`]; once a frame
/// has started the read continues until it is full or the stream ends.
///
/// # Errors
/// Returns any I/O error other than `Interrupted` / `WouldBlock`.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<PipeRead> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(PipeRead::Eof),
            Ok(n) => total += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock && total == 0 => {
                return Ok(PipeRead::Empty);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => std::thread::yield_now(),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(PipeRead::Full)
}

/// Source vidéo synchrone : un appel `read_frame` = une frame lue sur le pipe ffmpeg.
///
/// # Example
/// ```no_run
/// use tf_core::traits::RasterSource;
/// use tf_source::video::VideoSource;
/// let source = VideoSource::open("clip.mp4", 640).unwrap();
/// println!("{:?}", source.native_frame_rate());
/// ```
pub struct VideoSource {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    info: VideoInfo,
    decode: (u32, u32),
}

impl VideoSource {
    /// Probe then start decoding `identifier`.
    ///
    /// # Errors
    /// Fails if the source cannot be probed or ffmpeg cannot be started.
    pub fn open(identifier: &str, max_decode_width: u32) -> Result<Self> {
        let info = probe_video(identifier)?;
        let decode = decode_size(info.width, info.height, max_decode_width);
        let mut child = spawn_ffmpeg_pipe(identifier, (info.width, info.height), decode)?;
        let stdout = child.stdout.take().context("stdout ffmpeg indisponible")?;
        Ok(Self {
            child: Some(child),
            stdout: Some(stdout),
            info,
            decode,
        })
    }

    /// Probed stream metadata.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    fn frame_bytes(&self) -> usize {
        self.decode.0 as usize * self.decode.1 as usize * 3
    }
}

impl RasterSource for VideoSource {
    fn read_frame(&mut self) -> Result<FrameRead> {
        let len = self.frame_bytes();
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(FrameRead::EndOfStream);
        };
        let mut buf = vec![0u8; len];
        match read_exact_or_eof(stdout, &mut buf)? {
            PipeRead::Full => Ok(FrameRead::Frame(RawFrame::new(
                buf,
                self.decode.0,
                self.decode.1,
                ChannelOrder::Bgr,
            )?)),
            PipeRead::Empty => Ok(FrameRead::Gap),
            PipeRead::Eof => {
                log::info!("Vidéo : EOF, fin du flux.");
                self.stdout = None;
                Ok(FrameRead::EndOfStream)
            }
        }
    }

    fn native_frame_rate(&self) -> Option<f64> {
        Some(self.info.fps)
    }

    fn close(&mut self) {
        self.stdout = None;
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
            log::debug!("ffmpeg arrêté.");
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.close();
    }
}
