mod capture_tests;
mod hotkey_tests;
