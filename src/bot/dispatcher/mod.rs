pub mod dispatcher;
pub mod tokenizer;
pub mod coercer;
pub mod resolver;
