//! Displacement render model
//!
//! The render model holds the values a displacement renderer reads from its displacement map
//! configuration: per-axis offset and scale in pixel units, and the map channel that drives each
//! axis. [`DisplacementRenderModel`] is an immutable snapshot; [`MutableDisplacementRenderModel`]
//! wraps one for in-place edits. Both implement [`DisplacementModel`], so code that packs shader
//! parameters does not care which one it holds.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis of a displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis
    Horizontal,
    /// The y axis
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

/// Channel of the displacement map representing a displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplacementChannel {
    /// Red channel
    Red,
    /// Green channel
    Green,
    /// Blue channel
    Blue,
}

impl DisplacementChannel {
    /// Value of this channel in the shader parameter record
    pub fn as_raw(&self) -> u32 {
        match self {
            DisplacementChannel::Red => 0,
            DisplacementChannel::Green => 1,
            DisplacementChannel::Blue => 2,
        }
    }
}

impl TryFrom<u32> for DisplacementChannel {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(DisplacementChannel::Red),
            1 => Ok(DisplacementChannel::Green),
            2 => Ok(DisplacementChannel::Blue),
            _ => Err(Error::ChannelOutOfRange(value)),
        }
    }
}

/// Read access to displacement render model values
pub trait DisplacementModel {
    /// Offset in pixel units added to the horizontal displacement map values
    fn horizontal_offset(&self) -> f64;
    /// Offset in pixel units added to the vertical displacement map values
    fn vertical_offset(&self) -> f64;
    /// Scale in pixel units multiplied by the horizontal displacement map values. Always positive
    fn horizontal_scale(&self) -> f64;
    /// Scale in pixel units multiplied by the vertical displacement map values. Always positive
    fn vertical_scale(&self) -> f64;
    /// Map channel representing the horizontal displacement
    fn horizontal_channel(&self) -> DisplacementChannel;
    /// Map channel representing the vertical displacement
    fn vertical_channel(&self) -> DisplacementChannel;
}

/// Accepts a scale only if it stays positive and finite once narrowed to the shader's `f32`
fn validate_scale(axis: Axis, value: f64) -> Result<f64> {
    let packed = value as f32;
    // NaN fails the comparison as well
    if packed > 0.0 && packed.is_finite() { Ok(value) } else { Err(Error::NonPositiveScale { axis, value }) }
}

/// Immutable displacement render model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDisplacementRenderModel")]
pub struct DisplacementRenderModel {
    horizontal_offset: f64,
    vertical_offset: f64,
    horizontal_scale: f64,
    vertical_scale: f64,
    horizontal_channel: DisplacementChannel,
    vertical_channel: DisplacementChannel,
}

impl DisplacementRenderModel {
    /// Creates a render model from the given values
    ///
    /// The same channel may drive both axes.
    ///
    /// # Errors
    /// [`Error::NonPositiveScale`] if either scale is not strictly positive
    pub fn new(
        horizontal_offset: f64,
        vertical_offset: f64,
        horizontal_scale: f64,
        vertical_scale: f64,
        horizontal_channel: DisplacementChannel,
        vertical_channel: DisplacementChannel,
    ) -> Result<Self> {
        Ok(Self {
            horizontal_offset,
            vertical_offset,
            horizontal_scale: validate_scale(Axis::Horizontal, horizontal_scale)?,
            vertical_scale: validate_scale(Axis::Vertical, vertical_scale)?,
            horizontal_channel,
            vertical_channel,
        })
    }

    /// Returns a mutable copy of this model
    pub fn to_mutable(&self) -> MutableDisplacementRenderModel {
        MutableDisplacementRenderModel { model: self.clone() }
    }
}

impl DisplacementModel for DisplacementRenderModel {
    fn horizontal_offset(&self) -> f64 {
        self.horizontal_offset
    }

    fn vertical_offset(&self) -> f64 {
        self.vertical_offset
    }

    fn horizontal_scale(&self) -> f64 {
        self.horizontal_scale
    }

    fn vertical_scale(&self) -> f64 {
        self.vertical_scale
    }

    fn horizontal_channel(&self) -> DisplacementChannel {
        self.horizontal_channel
    }

    fn vertical_channel(&self) -> DisplacementChannel {
        self.vertical_channel
    }
}

/// Unvalidated form used when deserializing
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDisplacementRenderModel {
    #[serde(default)]
    horizontal_offset: f64,
    #[serde(default)]
    vertical_offset: f64,
    horizontal_scale: f64,
    vertical_scale: f64,
    horizontal_channel: DisplacementChannel,
    vertical_channel: DisplacementChannel,
}

impl TryFrom<RawDisplacementRenderModel> for DisplacementRenderModel {
    type Error = Error;

    fn try_from(raw: RawDisplacementRenderModel) -> Result<Self> {
        Self::new(raw.horizontal_offset, raw.vertical_offset, raw.horizontal_scale, raw.vertical_scale, raw.horizontal_channel, raw.vertical_channel)
    }
}

/// Mutable displacement render model
///
/// Setters validate eagerly, so the wrapped values are valid at every point and
/// [`MutableDisplacementRenderModel::freeze`] can not fail.
#[derive(Debug, Clone, PartialEq)]
pub struct MutableDisplacementRenderModel {
    model: DisplacementRenderModel,
}

impl MutableDisplacementRenderModel {
    /// Creates a mutable render model from the given values
    ///
    /// # Errors
    /// [`Error::NonPositiveScale`] if either scale is not strictly positive
    pub fn new(
        horizontal_offset: f64,
        vertical_offset: f64,
        horizontal_scale: f64,
        vertical_scale: f64,
        horizontal_channel: DisplacementChannel,
        vertical_channel: DisplacementChannel,
    ) -> Result<Self> {
        DisplacementRenderModel::new(horizontal_offset, vertical_offset, horizontal_scale, vertical_scale, horizontal_channel, vertical_channel).map(Self::from)
    }

    /// Sets the horizontal offset
    pub fn set_horizontal_offset(&mut self, value: f64) {
        self.model.horizontal_offset = value;
    }

    /// Sets the vertical offset
    pub fn set_vertical_offset(&mut self, value: f64) {
        self.model.vertical_offset = value;
    }

    /// Sets the horizontal scale, leaving the model unchanged on error
    pub fn set_horizontal_scale(&mut self, value: f64) -> Result<()> {
        self.model.horizontal_scale = validate_scale(Axis::Horizontal, value)?;
        Ok(())
    }

    /// Sets the vertical scale, leaving the model unchanged on error
    pub fn set_vertical_scale(&mut self, value: f64) -> Result<()> {
        self.model.vertical_scale = validate_scale(Axis::Vertical, value)?;
        Ok(())
    }

    /// Selects the map channel driving the horizontal displacement
    pub fn set_horizontal_channel(&mut self, channel: DisplacementChannel) {
        self.model.horizontal_channel = channel;
    }

    /// Selects the map channel driving the vertical displacement
    pub fn set_vertical_channel(&mut self, channel: DisplacementChannel) {
        self.model.vertical_channel = channel;
    }

    /// Returns an immutable snapshot of the current values
    pub fn freeze(&self) -> DisplacementRenderModel {
        self.model.clone()
    }
}

impl From<DisplacementRenderModel> for MutableDisplacementRenderModel {
    fn from(model: DisplacementRenderModel) -> Self {
        Self { model }
    }
}

impl DisplacementModel for MutableDisplacementRenderModel {
    fn horizontal_offset(&self) -> f64 {
        self.model.horizontal_offset
    }

    fn vertical_offset(&self) -> f64 {
        self.model.vertical_offset
    }

    fn horizontal_scale(&self) -> f64 {
        self.model.horizontal_scale
    }

    fn vertical_scale(&self) -> f64 {
        self.model.vertical_scale
    }

    fn horizontal_channel(&self) -> DisplacementChannel {
        self.model.horizontal_channel
    }

    fn vertical_channel(&self) -> DisplacementChannel {
        self.model.vertical_channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DisplacementChannel::{Blue, Green, Red};

    fn model(horizontal_scale: f64, vertical_scale: f64) -> Result<DisplacementRenderModel> {
        DisplacementRenderModel::new(-0.5, 0.25, horizontal_scale, vertical_scale, Red, Green)
    }

    #[test]
    fn test_positive_scales_accepted() {
        let model = model(1e-6, 12.0).unwrap();

        assert_eq!(model.horizontal_offset(), -0.5);
        assert_eq!(model.vertical_offset(), 0.25);
        assert_eq!(model.horizontal_scale(), 1e-6);
        assert_eq!(model.vertical_scale(), 12.0);
        assert_eq!(model.horizontal_channel(), Red);
        assert_eq!(model.vertical_channel(), Green);
    }

    #[test]
    fn test_non_positive_scales_rejected() {
        for value in [0.0, -0.0, -1.0, f64::NAN, f64::NEG_INFINITY, f64::INFINITY] {
            let error = model(value, 1.0).unwrap_err();
            assert!(matches!(error, Error::NonPositiveScale { axis: Axis::Horizontal, .. }), "{value}");

            let error = model(1.0, value).unwrap_err();
            assert!(matches!(error, Error::NonPositiveScale { axis: Axis::Vertical, .. }), "{value}");
        }
    }

    #[test]
    fn test_scales_outside_f32_range_rejected() {
        // Underflows to zero and overflows to infinity once packed
        for value in [1e-50, 1e300, f64::from(f32::MAX) * 2.0] {
            assert!(matches!(model(value, 1.0), Err(Error::NonPositiveScale { axis: Axis::Horizontal, .. })), "{value}");
            assert!(matches!(model(1.0, value), Err(Error::NonPositiveScale { axis: Axis::Vertical, .. })), "{value}");
        }

        let mut mutable = model(1.0, 1.0).unwrap().to_mutable();
        assert!(mutable.set_vertical_scale(1e-50).is_err());
        assert_eq!(mutable.vertical_scale(), 1.0);
    }

    #[test]
    fn test_f32_edge_scales_accepted() {
        let smallest = f64::from(f32::from_bits(1));
        let largest = f64::from(f32::MAX);
        let model = model(smallest, largest).unwrap();

        assert_eq!(model.horizontal_scale(), smallest);
        assert_eq!(model.vertical_scale(), largest);
    }

    #[test]
    fn test_same_channel_for_both_axes() {
        let model = DisplacementRenderModel::new(0.0, 0.0, 1.0, 1.0, Blue, Blue).unwrap();
        assert_eq!(model.horizontal_channel(), model.vertical_channel());
    }

    #[test]
    fn test_mutable_edits() {
        let mut mutable = model(1.0, 2.0).unwrap().to_mutable();

        mutable.set_horizontal_offset(3.0);
        mutable.set_vertical_offset(-4.0);
        mutable.set_horizontal_channel(Blue);
        mutable.set_vertical_channel(Red);
        mutable.set_horizontal_scale(5.0).unwrap();
        mutable.set_vertical_scale(6.0).unwrap();

        let frozen = mutable.freeze();
        assert_eq!(frozen, DisplacementRenderModel::new(3.0, -4.0, 5.0, 6.0, Blue, Red).unwrap());
    }

    #[test]
    fn test_mutable_rejects_invalid_scale_without_change() {
        let original = model(1.0, 2.0).unwrap();
        let mut mutable = MutableDisplacementRenderModel::from(original.clone());

        assert!(mutable.set_horizontal_scale(0.0).is_err());
        assert!(mutable.set_vertical_scale(-3.0).is_err());
        assert_eq!(mutable.freeze(), original);
    }

    #[test]
    fn test_accessors_are_polymorphic() {
        fn describe(model: &impl DisplacementModel) -> (f64, f64, DisplacementChannel) {
            (model.horizontal_scale(), model.vertical_offset(), model.horizontal_channel())
        }

        let model = model(2.0, 3.0).unwrap();
        let mutable = model.to_mutable();
        assert_eq!(describe(&model), describe(&mutable));
    }

    #[test]
    fn test_channel_raw_values() {
        for channel in [Red, Green, Blue] {
            assert_eq!(DisplacementChannel::try_from(channel.as_raw()).unwrap(), channel);
        }
        assert_eq!(DisplacementChannel::try_from(3).unwrap_err(), Error::ChannelOutOfRange(3));
    }

    #[test]
    fn test_deserialize_validates_scale() {
        let model: DisplacementRenderModel =
            serde_json::from_str(r#"{"horizontal_scale": 4, "vertical_scale": 2, "horizontal_channel": "red", "vertical_channel": "blue"}"#).unwrap();
        assert_eq!(model, DisplacementRenderModel::new(0.0, 0.0, 4.0, 2.0, Red, Blue).unwrap());

        let error = serde_json::from_str::<DisplacementRenderModel>(r#"{"horizontal_scale": 0, "vertical_scale": 2, "horizontal_channel": "red", "vertical_channel": "blue"}"#).unwrap_err();
        assert!(error.to_string().contains("horizontal scale must be positive"));
    }

    #[test]
    fn test_serialize_then_deserialize() {
        let model = model(1.5, 2.5).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(serde_json::from_str::<DisplacementRenderModel>(&json).unwrap(), model);
    }
}
