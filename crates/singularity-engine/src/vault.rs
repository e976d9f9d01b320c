//! The code vault: reference snippets unlocked by progress.

use serde::Serialize;

/// A reference snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultEntry {
    /// Stable identifier.
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Example code.
    pub code: &'static str,
    /// One-line explanation.
    pub description: &'static str,
    /// Level at which the entry becomes visible.
    pub unlocked_at_level: u32,
}

const fn entry(
    id: &'static str,
    title: &'static str,
    code: &'static str,
    description: &'static str,
    unlocked_at_level: u32,
) -> VaultEntry {
    VaultEntry {
        id,
        title,
        code,
        description,
        unlocked_at_level,
    }
}

/// Every vault entry, ordered by unlock level.
pub static ENTRIES: [VaultEntry; 30] = [
    entry("basics_print", "Print", "print(\"Hello\")", "Output text.", 1),
    entry("basics_vars", "Variables", "x = 10", "Store data.", 2),
    entry("basics_math", "Math", "10 + 5", "Arithmetic ops.", 3),
    entry("basics_str", "Strings", "\"A\"+\"B\"", "Concatenation.", 4),
    entry("basics_if", "If Statement", "if x > 5:\n  print(\"Yes\")", "Conditions.", 5),
    entry("basics_else", "If/Else", "if x:\n  do_a()\nelse:\n  do_b()", "Alternate paths.", 5),
    entry("basics_for", "For Loop", "for i in range(5):", "Iteration.", 6),
    entry("basics_while", "While Loop", "while x < 5:", "Loop until condition false.", 7),
    entry("basics_list", "Lists", "items = [1, 2]", "Store multiple items.", 10),
    entry("list_append", "List Append", "items.append(3)", "Add item to list.", 10),
    entry("basics_slice", "Slicing", "s[0:3]", "Extract sub-string.", 13),
    entry("str_len", "Length", "len(s)", "Get length.", 13),
    entry("basics_dict", "Dictionary", "d = {\"k\": \"v\"}", "Key-Value pairs.", 14),
    entry("basics_func", "Define Function", "def f():\n  return 1", "Reusable code blocks.", 15),
    entry("func_call", "Call Function", "f()", "Execute a function.", 15),
    entry("basics_break", "Break", "break", "Exit loop immediately.", 19),
    entry("str_replace", "String Replace", "s.replace(\"old\", \"new\")", "Substitute text.", 22),
    entry("list_append_method", "Append", "list.append(item)", "Add to end of list.", 23),
    entry("dict_update", "Dict Update", "d[\"key\"] = val", "Change dictionary value.", 25),
    entry("func_args", "Function Args", "def f(x, y):", "Multiple parameters.", 27),
    entry("f_string", "F-String", "f\"Value: {x}\"", "Formatted strings.", 29),
    entry("recursion", "Recursion", "def f(n):\n f(n-1)", "Function calling itself.", 30),
    entry("modules", "Import", "import math", "Use external libraries.", 31),
    entry("exceptions", "Try/Except", "try:\n 1/0\nexcept:\n pass", "Handle errors.", 32),
    entry("classes", "Class", "class Dog:\n pass", "Define Object Blueprint.", 33),
    entry("methods", "Method", "def bark(self):", "Function inside class.", 34),
    entry("sorting", "Sort", "list.sort()", "Order list items.", 36),
    entry("file_io", "File Write", "open(\"f.txt\", \"w\")", "Write to file.", 37),
    entry("file_read", "File Read", "f.read()", "Read file content.", 38),
    entry("lambda", "Lambda", "lambda x: x*2", "Anonymous function.", 39),
];

/// Entries visible to a learner currently on `level_id`.
pub fn unlocked(level_id: u32) -> impl Iterator<Item = &'static VaultEntry> {
    ENTRIES
        .iter()
        .filter(move |entry| entry.unlocked_at_level <= level_id)
}
