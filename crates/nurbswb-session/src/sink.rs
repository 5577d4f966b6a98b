//! Receiver for geometry produced by a session.

use nurbswb_kernel::{IsoCurve, SurfaceDescriptor, WeightedPoint};
use nurbswb_math::Point3;

/// Consumer of rebuilt geometry, typically a viewer or document.
///
/// Every method has an empty default, so a sink only implements what it
/// displays.
pub trait GeometrySink {
    /// The surface was rebuilt: new descriptor and its sampled wireframe.
    fn surface_rebuilt(&mut self, _descriptor: &SurfaceDescriptor, _wireframe: &[IsoCurve]) {}

    /// Straight polylines through the current poles.
    fn poles_changed(&mut self, _polylines: &[Vec<Point3>]) {}

    /// The poles inside the selection rectangle.
    fn selection_changed(&mut self, _poles: &[WeightedPoint]) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl GeometrySink for NullSink {}

impl<S: GeometrySink + ?Sized> GeometrySink for &mut S {
    fn surface_rebuilt(&mut self, descriptor: &SurfaceDescriptor, wireframe: &[IsoCurve]) {
        (**self).surface_rebuilt(descriptor, wireframe)
    }

    fn poles_changed(&mut self, polylines: &[Vec<Point3>]) {
        (**self).poles_changed(polylines)
    }

    fn selection_changed(&mut self, poles: &[WeightedPoint]) {
        (**self).selection_changed(poles)
    }
}
