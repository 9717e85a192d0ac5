use crate::browser;
use anyhow::Result;
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
// and the Timer futures never need to be Send
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stage coordinates : origin at the center of the viewing area
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// Axis aligned box, `position` is the top left corner
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    /// Box of `size` centered on `center`
    pub fn centered(center: Point, size: Size) -> Self {
        Rect {
            position: Point {
                x: center.x - size.width / 2.0,
                y: center.y - size.height / 2.0,
            },
            size,
        }
    }

    pub fn left(&self) -> f64 {
        self.position.x
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.size.width
    }

    pub fn top(&self) -> f64 {
        self.position.y
    }

    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.height
    }

    /// Strict overlap : boxes that only share an edge do NOT intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() <= other.left()
            || self.left() >= other.right()
            || self.bottom() <= other.top()
            || self.top() >= other.bottom())
    }
}

/// Bounding box overlap of two sprites sharing the same `footprint`
/// - symmetric : collides(a, b, f) == collides(b, a, f)
pub fn collides(a: Point, b: Point, footprint: Size) -> bool {
    Rect::centered(a, footprint).intersects(&Rect::centered(b, footprint))
}

/// Region a sprite center is allowed to occupy
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Keep the whole footprint inside a `stage` centered on the origin
    pub fn for_stage(stage: Size, footprint: Size) -> Self {
        let half_w = ((stage.width - footprint.width) / 2.0).max(0.0);
        let half_h = ((stage.height - footprint.height) / 2.0).max(0.0);
        Bounds {
            min: Point::new(-half_w, -half_h),
            max: Point::new(half_w, half_h),
        }
    }

    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.min.x, self.max.x),
            y: point.y.clamp(self.min.y, self.max.y),
        }
    }
}

/// Every suspension point of playback goes through a Timer
/// - browser : setTimeout
/// - tests   : returns immediately and records the requested delay
#[async_trait(?Send)]
pub trait Timer {
    async fn sleep(&self, millis: u32);
}

#[derive(Debug, Default, Copy, Clone)]
pub struct BrowserTimer;

#[async_trait(?Send)]
impl Timer for BrowserTimer {
    async fn sleep(&self, millis: u32) {
        if let Err(err) = wait(millis).await {
            log::warn!("[engine.rs::sleep] timer failed, continuing : {:#}", err);
        }
    }
}

/// Resolve after `millis` using the window's setTimeout
pub async fn wait(millis: u32) -> Result<()> {
    browser::set_timeout(millis).await
}
