use std::any::Any;

/// Downcasting support for boxed views and states.
///
/// Call through the trait object (`boxed.as_mut().as_any_mut()`), never on the
/// `Box` itself: the box is `Any` too.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
