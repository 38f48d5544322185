//! Video mode selection.

use crate::config::VideoModePolicy;
use crate::error::LoadError;
use crate::mock::firmware::linear_mode;
use crate::video::{select_video_mode, VideoModeInfo};

fn blt_only(index: u32, width: u32, height: u32) -> VideoModeInfo {
    VideoModeInfo {
        linear: false,
        ..linear_mode(index, width, height, width)
    }
}

fn largest(modes: &[VideoModeInfo]) -> Result<u32, LoadError> {
    select_video_mode(VideoModePolicy::Largest, modes).map(|m| m.index)
}

#[test]
fn test_largest_picks_biggest_mode() {
    let modes = [
        linear_mode(0, 640, 480, 640),
        linear_mode(1, 800, 600, 800),
        linear_mode(2, 1024, 768, 1024),
    ];
    assert_eq!(largest(&modes), Ok(2));
}

#[test]
fn test_largest_requires_both_dimensions_to_grow() {
    // Mode 1 is taller but not wider, so the scan stays on mode 0.
    let modes = [
        linear_mode(0, 1024, 768, 1024),
        linear_mode(1, 1024, 1024, 1024),
        linear_mode(2, 1280, 720, 1280),
    ];
    assert_eq!(largest(&modes), Ok(0));
}

#[test]
fn test_largest_scan_is_order_dependent() {
    let modes = [
        linear_mode(0, 800, 600, 800),
        linear_mode(1, 1920, 700, 1920),
        linear_mode(2, 1024, 768, 1024),
    ];
    assert_eq!(largest(&modes), Ok(1));

    let reordered = [modes[2], modes[1], modes[0]];
    assert_eq!(largest(&reordered), Ok(2));
}

#[test]
fn test_largest_ties_go_to_first_mode() {
    let modes = [
        linear_mode(3, 800, 600, 800),
        linear_mode(4, 800, 600, 832),
    ];
    assert_eq!(largest(&modes), Ok(3));
}

#[test]
fn test_non_linear_modes_skipped() {
    let modes = [
        linear_mode(0, 640, 480, 640),
        blt_only(1, 1920, 1080),
    ];
    assert_eq!(largest(&modes), Ok(0));
}

#[test]
fn test_no_modes_is_fatal() {
    assert_eq!(largest(&[]), Err(LoadError::NoVideoMode));
    assert_eq!(largest(&[blt_only(0, 800, 600)]), Err(LoadError::NoVideoMode));
}

#[test]
fn test_exact_picks_first_match() {
    let modes = [
        linear_mode(0, 1024, 768, 1024),
        linear_mode(1, 800, 600, 800),
        linear_mode(2, 800, 600, 816),
    ];
    let policy = VideoModePolicy::Exact {
        width: 800,
        height: 600,
    };
    assert_eq!(select_video_mode(policy, &modes).map(|m| m.index), Ok(1));
}

#[test]
fn test_exact_without_match_is_fatal() {
    let modes = [linear_mode(0, 1024, 768, 1024), blt_only(1, 800, 600)];
    let policy = VideoModePolicy::Exact {
        width: 800,
        height: 600,
    };
    assert_eq!(select_video_mode(policy, &modes), Err(LoadError::NoVideoMode));
}
