pub mod http_downloader;
pub mod yt_dlp_downloader;

use crate::acquisition::domain::media_downloader::MediaDownloader;
use crate::shared::constants::MEDIA_EXTENSIONS;

use http_downloader::HttpDownloader;
use yt_dlp_downloader::YtDlpDownloader;

/// Direct links to media files are streamed over HTTP; everything else
/// (watch pages, playlists, share links) goes through yt-dlp.
pub fn downloader_for(reference: &str, yt_dlp_program: &str) -> Box<dyn MediaDownloader> {
    if is_direct_media_link(reference) {
        Box::new(HttpDownloader)
    } else {
        Box::new(YtDlpDownloader::new(yt_dlp_program))
    }
}

fn is_direct_media_link(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return false;
    }
    let path = lower
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    // the dot must belong to the last path segment, not the host
    !ext.contains('/') && MEDIA_EXTENSIONS.contains(&ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::mp4("https://cdn.example.com/clips/hand.mp4", true)]
    #[case::upper_case("HTTPS://cdn.example.com/A.MOV", true)]
    #[case::query("http://host/v.webm?token=abc", true)]
    #[case::watch_page("https://www.youtube.com/watch?v=abc123", false)]
    #[case::short_link("https://youtu.be/abc123", false)]
    #[case::host_only("https://video.mp4/", false)]
    #[case::not_media("https://host/page.html", false)]
    #[case::local_path("clips/hand.mp4", false)]
    fn test_direct_media_link(#[case] reference: &str, #[case] expected: bool) {
        assert_eq!(is_direct_media_link(reference), expected);
    }

    #[test]
    fn test_downloader_for_picks_adapter() {
        assert_eq!(downloader_for("https://h/x.mkv", "yt-dlp").name(), "http");
        assert_eq!(
            downloader_for("https://youtu.be/abc", "yt-dlp").name(),
            "yt-dlp"
        );
    }
}
