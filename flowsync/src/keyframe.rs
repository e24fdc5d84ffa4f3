//! Timeline keyframes and the per-property sampling math.

use bitflags::bitflags;
use serde::Deserialize;
use serde::Serialize;

use crate::easing::Easing;
use crate::error::TimelineError;
use crate::toolkit::{SIZE_CONTENT, StyleProp};

bitflags! {
    /// Which properties a keyframe drives.
    ///
    /// `CP1`/`CP2` modify how X and Y move (quadratic/cubic Bezier) and are
    /// never animated on their own.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TimelineProperties: u32 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const WIDTH = 1 << 2;
        const HEIGHT = 1 << 3;
        const OPACITY = 1 << 4;
        const SCALE = 1 << 5;
        const ROTATE = 1 << 6;
        const CP1 = 1 << 7;
        const CP2 = 1 << 8;
    }
}

/// Target value and easing for one driven property.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Track {
    pub value: f32,
    pub easing: Easing,
}

impl Track {
    pub fn new(value: f32, easing: Easing) -> Self {
        Self { value, easing }
    }
}

/// Bezier control offsets for position keyframes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlPoints {
    pub cp1x: i32,
    pub cp1y: i32,
    pub cp2x: i32,
    pub cp2y: i32,
}

/// One `[start, end]` interval of a widget's timeline.
///
/// Built with the chained setters; each setter also enables its property bit.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub start: f32,
    pub end: f32,
    pub enabled: TimelineProperties,
    pub x: Track,
    pub y: Track,
    pub width: Track,
    pub height: Track,
    /// Opacity in [0, 1].
    pub opacity: Track,
    pub scale: Track,
    pub rotate: Track,
    pub control_points: ControlPoints,
}

impl Keyframe {
    pub fn new(start: f32, end: f32) -> Self {
        Self {
            start,
            end,
            enabled: TimelineProperties::empty(),
            x: Track::default(),
            y: Track::default(),
            width: Track::default(),
            height: Track::default(),
            opacity: Track::default(),
            scale: Track::default(),
            rotate: Track::default(),
            control_points: ControlPoints::default(),
        }
    }

    /// A keyframe that assigns its targets instantly at `position`.
    pub fn at(position: f32) -> Self {
        Self::new(position, position)
    }

    pub fn x(mut self, value: i16, easing: Easing) -> Self {
        self.x = Track::new(value as f32, easing);
        self.enabled |= TimelineProperties::X;
        self
    }

    pub fn y(mut self, value: i16, easing: Easing) -> Self {
        self.y = Track::new(value as f32, easing);
        self.enabled |= TimelineProperties::Y;
        self
    }

    pub fn width(mut self, value: i16, easing: Easing) -> Self {
        self.width = Track::new(value as f32, easing);
        self.enabled |= TimelineProperties::WIDTH;
        self
    }

    pub fn height(mut self, value: i16, easing: Easing) -> Self {
        self.height = Track::new(value as f32, easing);
        self.enabled |= TimelineProperties::HEIGHT;
        self
    }

    pub fn opacity(mut self, value: f32, easing: Easing) -> Self {
        self.opacity = Track::new(value, easing);
        self.enabled |= TimelineProperties::OPACITY;
        self
    }

    pub fn scale(mut self, value: i16, easing: Easing) -> Self {
        self.scale = Track::new(value as f32, easing);
        self.enabled |= TimelineProperties::SCALE;
        self
    }

    pub fn rotate(mut self, value: i16, easing: Easing) -> Self {
        self.rotate = Track::new(value as f32, easing);
        self.enabled |= TimelineProperties::ROTATE;
        self
    }

    /// Quadratic Bezier control point for X/Y.
    pub fn cp1(mut self, x: i32, y: i32) -> Self {
        self.control_points.cp1x = x;
        self.control_points.cp1y = y;
        self.enabled |= TimelineProperties::CP1;
        self
    }

    /// Second control point; together with CP1 this makes the X/Y path cubic.
    pub fn cp2(mut self, x: i32, y: i32) -> Self {
        self.control_points.cp2x = x;
        self.control_points.cp2y = y;
        self.enabled |= TimelineProperties::CP2;
        self
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Checks everything except range orientation, which is a registry policy.
    pub fn validate(&self) -> Result<(), TimelineError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(TimelineError::NonFinite);
        }
        let uses_control_points = self
            .enabled
            .intersects(TimelineProperties::CP1 | TimelineProperties::CP2);
        let moves = self
            .enabled
            .intersects(TimelineProperties::X | TimelineProperties::Y);
        if uses_control_points && !moves {
            return Err(TimelineError::ControlPointsWithoutPosition);
        }
        Ok(())
    }

    /// Local progress at `position`, assuming `start <= position <= end`.
    fn progress(&self, position: f32) -> f32 {
        if self.start == self.end {
            1.0
        } else {
            (position - self.start) / (self.end - self.start)
        }
    }

    fn position_axis(&self, from: f32, track: Track, cp1: i32, cp2: i32, t: f32) -> f32 {
        let t2 = track.easing.apply(t);
        if self.enabled.contains(TimelineProperties::CP2) {
            cubic_bezier(from, cp1 as f32, cp2 as f32, track.value, t2)
        } else if self.enabled.contains(TimelineProperties::CP1) {
            quadratic_bezier(from, cp1 as f32, track.value, t2)
        } else {
            (1.0 - t2) * from + t2 * track.value
        }
    }

    fn blend_into(&self, values: &mut AnimatedValues, position: f32) {
        let t = self.progress(position);
        let cp = self.control_points;
        let e = self.enabled;

        if e.contains(TimelineProperties::X) {
            values.x = self.position_axis(values.x, self.x, cp.cp1x, cp.cp2x, t);
        }
        if e.contains(TimelineProperties::Y) {
            values.y = self.position_axis(values.y, self.y, cp.cp1y, cp.cp2y, t);
        }
        if e.contains(TimelineProperties::WIDTH) {
            values.width = ease_towards(values.width, self.width, t);
        }
        if e.contains(TimelineProperties::HEIGHT) {
            values.height = ease_towards(values.height, self.height, t);
        }
        if e.contains(TimelineProperties::OPACITY) {
            values.opacity = ease_towards(values.opacity, self.opacity, t);
        }
        if e.contains(TimelineProperties::SCALE) {
            values.scale = ease_towards(values.scale, self.scale, t);
        }
        if e.contains(TimelineProperties::ROTATE) {
            values.rotate = ease_towards(values.rotate, self.rotate, t);
        }
    }

    fn snap_into(&self, values: &mut AnimatedValues) {
        let e = self.enabled;
        if e.contains(TimelineProperties::X) {
            values.x = self.x.value;
        }
        if e.contains(TimelineProperties::Y) {
            values.y = self.y.value;
        }
        if e.contains(TimelineProperties::WIDTH) {
            values.width = self.width.value;
        }
        if e.contains(TimelineProperties::HEIGHT) {
            values.height = self.height.value;
        }
        if e.contains(TimelineProperties::OPACITY) {
            values.opacity = self.opacity.value;
        }
        if e.contains(TimelineProperties::SCALE) {
            values.scale = self.scale.value;
        }
        if e.contains(TimelineProperties::ROTATE) {
            values.rotate = self.rotate.value;
        }
    }
}

/// Keyframe as handed over by the widget construction layer: raw property
/// bits and numeric easing ids. Missing fields deserialize to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawKeyframe {
    pub start: f32,
    pub end: f32,
    pub enabled_properties: u32,
    pub x: i16,
    pub x_easing: u8,
    pub y: i16,
    pub y_easing: u8,
    pub width: i16,
    pub width_easing: u8,
    pub height: i16,
    pub height_easing: u8,
    pub opacity: f32,
    pub opacity_easing: u8,
    pub scale: i16,
    pub scale_easing: u8,
    pub rotate: i16,
    pub rotate_easing: u8,
    pub cp1x: i32,
    pub cp1y: i32,
    pub cp2x: i32,
    pub cp2y: i32,
}

impl TryFrom<RawKeyframe> for Keyframe {
    type Error = TimelineError;

    fn try_from(raw: RawKeyframe) -> Result<Self, Self::Error> {
        let track = |value: f32, easing: u8| -> Result<Track, TimelineError> {
            Ok(Track::new(value, Easing::try_from(easing)?))
        };

        Ok(Keyframe {
            start: raw.start,
            end: raw.end,
            // Unknown bits are dropped.
            enabled: TimelineProperties::from_bits_truncate(raw.enabled_properties),
            x: track(raw.x as f32, raw.x_easing)?,
            y: track(raw.y as f32, raw.y_easing)?,
            width: track(raw.width as f32, raw.width_easing)?,
            height: track(raw.height as f32, raw.height_easing)?,
            opacity: track(raw.opacity, raw.opacity_easing)?,
            scale: track(raw.scale as f32, raw.scale_easing)?,
            rotate: track(raw.rotate as f32, raw.rotate_easing)?,
            control_points: ControlPoints {
                cp1x: raw.cp1x,
                cp1y: raw.cp1y,
                cp2x: raw.cp2x,
                cp2y: raw.cp2y,
            },
        })
    }
}

/// The seven animatable properties as interpolation-domain floats.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimatedValues {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// 0.0 to 1.0 (may overshoot while easing).
    pub opacity: f32,
    pub scale: f32,
    pub rotate: f32,
}

impl AnimatedValues {
    /// Convert a toolkit style snapshot (opacity 0..=255) into interpolation space.
    pub fn from_native(style: &NativeStyle) -> Self {
        Self {
            x: style.x as f32,
            y: style.y as f32,
            width: style.width as f32,
            height: style.height as f32,
            opacity: style.opacity as f32 / 255.0,
            scale: style.scale as f32,
            rotate: style.rotate as f32,
        }
    }

    /// Round to the toolkit's native precision.
    pub fn to_native(&self) -> NativeStyle {
        NativeStyle {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
            width: self.width.round() as i32,
            height: self.height.round() as i32,
            opacity: (self.opacity * 255.0).round().clamp(0.0, 255.0) as i32,
            scale: self.scale.round() as i32,
            rotate: self.rotate.round() as i32,
        }
    }
}

/// Style values in the toolkit's integer domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeStyle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub opacity: i32,
    pub scale: i32,
    pub rotate: i32,
}

impl NativeStyle {
    pub fn get(&self, prop: StyleProp) -> i32 {
        match prop {
            StyleProp::X => self.x,
            StyleProp::Y => self.y,
            StyleProp::Width => self.width,
            StyleProp::Height => self.height,
            StyleProp::Opacity => self.opacity,
            StyleProp::Scale => self.scale,
            StyleProp::Rotate => self.rotate,
        }
    }

    pub fn set(&mut self, prop: StyleProp, value: i32) {
        match prop {
            StyleProp::X => self.x = value,
            StyleProp::Y => self.y = value,
            StyleProp::Width => self.width = value,
            StyleProp::Height => self.height = value,
            StyleProp::Opacity => self.opacity = value,
            StyleProp::Scale => self.scale = value,
            StyleProp::Rotate => self.rotate = value,
        }
    }

    /// Properties to write back; content-sized width/height are left alone.
    pub fn writable(&self) -> impl Iterator<Item = (StyleProp, i32)> + '_ {
        StyleProp::ALL.into_iter().filter_map(move |prop| {
            let value = self.get(prop);
            let sized = matches!(prop, StyleProp::Width | StyleProp::Height);
            (!sized || value != SIZE_CONTENT).then_some((prop, value))
        })
    }
}

/// Evaluate a keyframe sequence at `position`, starting from `baseline`.
///
/// Keyframes are walked in registration order. Fully elapsed keyframes snap
/// their properties to target; the first keyframe whose interval contains
/// `position` blends from the running values and ends the walk. Inverted
/// keyframes (`start > end`) are skipped entirely.
pub fn sample(baseline: &AnimatedValues, keyframes: &[Keyframe], position: f32) -> AnimatedValues {
    let mut values = *baseline;

    for keyframe in keyframes {
        if keyframe.is_inverted() || position < keyframe.start {
            continue;
        }

        if position <= keyframe.end {
            keyframe.blend_into(&mut values, position);
            break;
        }

        keyframe.snap_into(&mut values);
    }

    values
}

fn ease_towards(from: f32, track: Track, t: f32) -> f32 {
    from + track.easing.apply(t) * (track.value - from)
}

fn quadratic_bezier(p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * p1 + 2.0 * u * t * p2 + t * t * p3
}

fn cubic_bezier(p1: f32, p2: f32, p3: f32, p4: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p1 + 3.0 * u * u * t * p2 + 3.0 * u * t * t * p3 + t * t * t * p4
}
