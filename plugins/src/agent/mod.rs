mod process;

pub use process::ProcessInvoker;
