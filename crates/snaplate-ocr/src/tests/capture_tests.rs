use snaplate_types::CaptureRegion;

use crate::capture::{MonitorBounds, select_monitor};

fn monitor(x: i32, y: i32, primary: bool) -> MonitorBounds {
    MonitorBounds {
        x,
        y,
        width: 1920,
        height: 1080,
        primary,
    }
}

fn region(x: i32, y: i32, width: u32, height: u32) -> CaptureRegion {
    CaptureRegion { x, y, width, height }
}

#[test]
fn test_whole_screen_uses_primary_monitor() {
    // Primary listed second, as happens with a monitor left of it
    let monitors = [monitor(-1920, 0, false), monitor(0, 0, true)];
    assert_eq!(select_monitor(&monitors, None), Some(1));
}

#[test]
fn test_region_picks_containing_monitor() {
    let monitors = [monitor(0, 0, true), monitor(1920, 0, false)];
    let inside_second = region(2000, 100, 300, 200);
    assert_eq!(select_monitor(&monitors, Some(&inside_second)), Some(1));

    let left_of_primary = [monitor(-1920, 0, false), monitor(0, 0, true)];
    let inside_first = region(-1900, 10, 100, 100);
    assert_eq!(select_monitor(&left_of_primary, Some(&inside_first)), Some(0));
}

#[test]
fn test_straddling_region_falls_back_to_primary() {
    let monitors = [monitor(-1920, 0, false), monitor(0, 0, true)];
    let across = region(-100, 0, 200, 100);
    assert_eq!(select_monitor(&monitors, Some(&across)), Some(1));
}

#[test]
fn test_no_primary_falls_back_to_first() {
    let monitors = [monitor(0, 0, false), monitor(1920, 0, false)];
    assert_eq!(select_monitor(&monitors, None), Some(0));
    assert_eq!(select_monitor(&monitors, Some(&region(5000, 0, 10, 10))), Some(0));
}

#[test]
fn test_no_monitors() {
    assert_eq!(select_monitor(&[], None), None);
    assert_eq!(select_monitor(&[], Some(&region(0, 0, 10, 10))), None);
}

#[test]
fn test_far_region_does_not_overflow() {
    let monitors = [monitor(0, 0, true)];
    let edge = region(i32::MAX - 1, i32::MAX - 1, u32::MAX, u32::MAX);
    assert_eq!(select_monitor(&monitors, Some(&edge)), Some(0));
}
