pub mod cashfree;
