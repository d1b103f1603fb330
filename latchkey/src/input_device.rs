//! Input device module
//!
//! This module defines the [`Runnable`] trait. Everything that runs as its own
//! task, the keyboard itself as well as matrix scanners and HID reporters built
//! on top of it, implements [`Runnable`].

/// The trait for runnable tasks.
pub trait Runnable {
    /// Run the task.
    async fn run(&mut self);
}
