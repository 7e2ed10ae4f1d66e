pub mod error;
pub mod scanner;
pub mod treewalk;

pub use treewalk::Interpreter;

pub use treewalk::execute;
