mod html_tests;
mod text_cleaning_tests;
