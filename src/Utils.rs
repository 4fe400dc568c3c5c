/// reading, validating and writing mechanism text (YAML or JSON)
pub mod load_from_file;
