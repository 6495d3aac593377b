//! Cross-component cascade tests: full kernel passes over fixture
//! scripts, asserting op sequences, scheduling, and context folds.

mod wait_tests;
