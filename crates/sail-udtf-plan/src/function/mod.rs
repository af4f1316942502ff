pub mod table_input;
