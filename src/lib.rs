// gucdk - declare scheduled tasks for Guardian-style stacks
//
// The binary wraps two commands:
// - synth: load configuration, compose a scheduled task, emit JSON
// - defaults: report the defaults applied for a runtime

pub mod defaults;
pub mod init;
pub mod synth;

pub use init::init_tracing;
pub use synth::SynthArgs;
