use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::shared::frame::{Frame, PixelOrder};
use crate::video::domain::frame_source::{FrameSource, SourceDescriptor, SourceError, SourceInfo};

/// Decodes frames from a file or capture device via ffmpeg-next
/// (libavformat + libavdevice + libavcodec).
///
/// Every decoded frame is converted to packed BGR24, the order cameras and
/// the display window use natively.
pub struct FfmpegSource {
    descriptor: SourceDescriptor,
    info: SourceInfo,
    stream: Option<OpenStream>,
    frame_index: usize,
}

// Safety: FfmpegSource is owned and driven by a single thread at a time.
// The raw pointers inside ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegSource {}

struct OpenStream {
    ictx: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<scaling::Context>,
    video_stream_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegSource {
    pub fn open(descriptor: &SourceDescriptor) -> Result<Self, SourceError> {
        ffmpeg_next::init().map_err(|e| SourceError::unavailable(descriptor, e))?;

        let ictx = match descriptor {
            SourceDescriptor::File(path) => open_file(path),
            SourceDescriptor::Device(index) => open_device(*index),
        }
        .map_err(|e| SourceError::unavailable(descriptor, e))?;

        let (video_stream_index, decoder, fps, total_frames) = {
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| SourceError::unavailable(descriptor, "no video stream found"))?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
                    .map_err(|e| SourceError::unavailable(descriptor, e))?;
            let decoder = codec_ctx
                .decoder()
                .video()
                .map_err(|e| SourceError::unavailable(descriptor, e))?;

            let rate = stream.rate();
            let fps = if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            };
            (stream.index(), decoder, fps, stream.frames().max(0) as usize)
        };

        let info = SourceInfo {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames,
        };
        log::info!(
            "Opened {descriptor}: {}x{} @ {:.2} fps ({} frames)",
            info.width,
            info.height,
            info.fps,
            info.total_frames
        );

        Ok(Self {
            descriptor: descriptor.clone(),
            info,
            stream: Some(OpenStream {
                ictx,
                decoder,
                scaler: None,
                video_stream_index,
                flushing: false,
                done: false,
            }),
            frame_index: 0,
        })
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        let frame = stream.next_frame(self.frame_index)?;
        if frame.is_some() {
            self.frame_index += 1;
        }
        Ok(frame)
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Released {}", self.descriptor);
        }
    }

    fn is_released(&self) -> bool {
        self.stream.is_none()
    }
}

impl OpenStream {
    fn next_frame(&mut self, index: usize) -> Result<Option<Frame>, SourceError> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.receive(index)? {
            return Ok(Some(frame));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.ictx) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Eof) => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                    if let Some(frame) = self.receive(index)? {
                        return Ok(Some(frame));
                    }
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => return Err(SourceError::Read(e.to_string())),
            }

            if packet.stream() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }

            if let Some(frame) = self.receive(index)? {
                return Ok(Some(frame));
            }
        }
    }

    fn receive(&mut self, index: usize) -> Result<Option<Frame>, SourceError> {
        let mut decoded = VideoFrame::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let (width, height) = (decoded.width(), decoded.height());
        let mut scaler = match self.scaler.take() {
            Some(s) if s.input().width == width && s.input().height == height => s,
            _ => scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::BGR24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| SourceError::Read(e.to_string()))?,
        };

        let mut bgr = VideoFrame::empty();
        let scaled = scaler.run(&decoded, &mut bgr);
        self.scaler = Some(scaler);
        scaled.map_err(|e| SourceError::Read(e.to_string()))?;

        let pixels = extract_packed_pixels(&bgr, width, height);
        Ok(Some(Frame::new(
            pixels,
            width,
            height,
            3,
            PixelOrder::Bgr,
            index,
        )))
    }
}

fn open_file(path: &Path) -> Result<Input, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err("file does not exist".into());
    }
    Ok(ffmpeg_next::format::input(path)?)
}

fn open_device(index: u32) -> Result<Input, Box<dyn std::error::Error>> {
    ffmpeg_next::device::register_all();

    let (format_names, url) =
        device_target(index).ok_or("capture devices by index are not supported on this platform")?;
    let format = ffmpeg_next::device::input::video()
        .find(|f| format_names.contains(&f.name()))
        .ok_or_else(|| format!("ffmpeg was built without {} support", format_names[0]))?;

    let ctx = ffmpeg_next::format::open_with(
        &url,
        &ffmpeg_next::format::format::Format::Input(format),
        ffmpeg_next::Dictionary::new(),
    )?;
    Ok(ctx.input())
}

/// libavdevice input format names and device URL for a camera index.
fn device_target(index: u32) -> Option<(&'static [&'static str], String)> {
    #[cfg(target_os = "linux")]
    {
        Some((
            &["video4linux2,v4l2", "video4linux2", "v4l2"],
            format!("/dev/video{index}"),
        ))
    }
    #[cfg(target_os = "macos")]
    {
        Some((&["avfoundation"], format!("{index}:none")))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = index;
        None
    }
}

/// Copies a packed 3-byte-per-pixel ffmpeg frame into a contiguous buffer.
///
/// ffmpeg rows may carry padding (stride > width*3); it is stripped here.
fn extract_packed_pixels(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Encodes `num_frames` flat-colored frames (blue-ish in BGR terms) as MPEG-4.
    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32) {
        ffmpeg_next::init().unwrap();
        let fps = 25;

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut to_yuv = scaling::Context::get(
            ffmpeg_next::format::Pixel::BGR24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .unwrap();

        let mut write_packets = |encoder: &mut ffmpeg_next::encoder::Video,
                                 octx: &mut ffmpeg_next::format::context::Output| {
            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(octx).unwrap();
            }
        };

        for i in 0..num_frames {
            let mut bgr = VideoFrame::new(ffmpeg_next::format::Pixel::BGR24, width, height);
            let stride = bgr.stride(0);
            let data = bgr.data_mut(0);
            for row in 0..height as usize {
                for col in 0..width as usize {
                    let offset = row * stride + col * 3;
                    data[offset] = 200;
                    data[offset + 1] = 60;
                    data[offset + 2] = 20;
                }
            }
            let mut yuv = VideoFrame::empty();
            to_yuv.run(&bgr, &mut yuv).unwrap();
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();
            write_packets(&mut encoder, &mut octx);
        }

        encoder.send_eof().unwrap();
        write_packets(&mut encoder, &mut octx);
        octx.write_trailer().unwrap();
    }

    fn test_video(dir: &Path, frames: usize) -> PathBuf {
        let path = dir.join("clip.mp4");
        create_test_video(&path, frames, 160, 120);
        path
    }

    #[test]
    fn test_open_reports_stream_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let source = FfmpegSource::open(&SourceDescriptor::File(path)).unwrap();
        assert_eq!(source.info().width, 160);
        assert_eq!(source.info().height, 120);
        assert!(source.info().fps > 0.0);
        assert!(!source.is_released());
    }

    #[test]
    fn test_open_missing_file_is_unavailable() {
        let descriptor = SourceDescriptor::File(PathBuf::from("/nonexistent/clip.mp4"));
        let err = FfmpegSource::open(&descriptor).err().unwrap();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        assert!(err.to_string().contains("/nonexistent/clip.mp4"));
    }

    #[test]
    fn test_open_non_video_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mp4");
        std::fs::write(&path, b"definitely not a video").unwrap();
        let err = FfmpegSource::open(&SourceDescriptor::File(path)).err().unwrap();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn test_reads_every_frame_then_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);
        let mut source = FfmpegSource::open(&SourceDescriptor::File(path)).unwrap();

        let mut count = 0;
        while let Some(frame) = source.read().unwrap() {
            assert_eq!(frame.index(), count);
            count += 1;
        }
        assert_eq!(count, 5);
        // exhausted sources keep reporting end instead of failing
        assert!(source.read().unwrap().is_none());
    }

    #[test]
    fn test_frames_are_packed_bgr() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);
        let mut source = FfmpegSource::open(&SourceDescriptor::File(path)).unwrap();

        let frame = source.read().unwrap().unwrap();
        assert_eq!(frame.order(), PixelOrder::Bgr);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data().len(), 160 * 120 * 3);
        // encoded as B=200 G=60 R=20; lossy, so only check dominance
        let px = &frame.data()[(60 * 160 + 80) * 3..][..3];
        assert!(px[0] > px[2], "expected blue-dominant pixel, got {px:?}");
    }

    #[test]
    fn test_release_is_idempotent_and_ends_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 3);
        let mut source = FfmpegSource::open(&SourceDescriptor::File(path)).unwrap();

        source.release();
        source.release();
        assert!(source.is_released());
        assert!(source.read().unwrap().is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_device_target_uses_v4l2_node() {
        let (formats, url) = device_target(2).unwrap();
        assert!(formats.contains(&"video4linux2,v4l2"));
        assert_eq!(url, "/dev/video2");
    }
}
