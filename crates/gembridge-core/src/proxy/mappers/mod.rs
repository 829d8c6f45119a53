// Mappers module - protocol converters

pub mod openai;
