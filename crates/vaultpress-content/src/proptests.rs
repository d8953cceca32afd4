//! Property-based tests for table splitting and frontmatter escaping.
