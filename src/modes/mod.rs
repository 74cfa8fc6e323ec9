pub mod dual_view;

pub use dual_view::DualViewMode;
