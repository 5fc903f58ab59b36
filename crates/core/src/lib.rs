//! Core library for the Lookout landmark demos.
//!
//! Layout follows a ports-and-adapters split: each area has a `domain`
//! module with plain types and traits, and an `infrastructure` module with
//! the adapters that talk to ffmpeg, ONNX Runtime, OpenCV HighGUI and the
//! network.

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod http_download;
    pub mod model_resolver;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod config;
        pub mod detection;
        pub mod detector;
    }
    pub mod infrastructure;
}

pub mod rendering {
    pub mod domain {
        pub mod drawing_spec;
        pub mod overlay_renderer;
    }
    pub mod infrastructure;
}

pub mod display {
    pub mod domain {
        pub mod display_surface;
    }
    pub mod infrastructure;
}

pub mod acquisition {
    pub mod domain {
        pub mod media_downloader;
    }
    pub mod infrastructure;
    pub mod video_acquirer;
}

pub mod pipeline {
    pub mod loop_controller;
    pub mod pipeline_logger;
}
