//! Sectors Lambda onward: methods, nesting, recursion, classes and files.

use crate::error::Result;
use crate::level::Mood::{Determined, Fear, Glitch, Neutral, Sad};
use crate::level::Speaker::{Adam, Cipher, DrChen, Kronos, System};
use crate::level::{ExamQuestion, Level, SeedTemplates, StorySegment as Line};
use crate::normalize::Submission;
use crate::normalize::View::{Collapsed, Quoted, Stripped};
use crate::validator::{Check, Validator};
use crate::verdict::Verdict;

// ============================================================================
// Quantum swap
// ============================================================================

/// Temporaries accepted for the three-step swap.
const SWAP_TEMPORARIES: [&str; 3] = ["temp", "tmp", "t"];

/// Returns the byte offset just past a recognized swap of `x` and `y`.
///
/// Accepts the tuple form, or a temporary assigned from `x` followed by
/// `x=y` and `y=<temporary>` in that order. Works on whitespace-stripped text.
fn swap_end(code: &str) -> Option<usize> {
    const TUPLE: &str = "x,y=y,x";
    if let Some(at) = code.find(TUPLE) {
        return Some(at + TUPLE.len());
    }
    SWAP_TEMPORARIES.iter().find_map(|temp| {
        let save = format!("{temp}=x");
        let restore = format!("y={temp}");
        let start = find_from(code, &save, 0)?;
        let moved = find_from(code, "x=y", start + save.len())?;
        let end = find_from(code, &restore, moved + 3)?;
        Some(end + restore.len())
    })
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|at| at + from)
}

fn validate_swap(submission: &Submission) -> Result<Verdict> {
    let code = submission.view(Stripped);
    if !code.contains("print(x)") || !code.contains("print(y)") {
        return Ok(Verdict::fail("Output: Print both x and y."));
    }
    let Some(end) = swap_end(code) else {
        return Ok(Verdict::fail("Swap failed. Expected x=20, y=10."));
    };
    let Some(x_at) = find_from(code, "print(x)", end) else {
        return Ok(Verdict::fail("Order: Print x and y after the swap."));
    };
    if find_from(code, "print(y)", x_at).is_none() {
        return Ok(Verdict::fail("Order: Print x and y after the swap."));
    }
    Ok(Verdict::pass("Quantum State Entangled.", "20\n10"))
}

// ============================================================================
// Levels 21-41
// ============================================================================

pub(super) static LEVELS: [Level; 21] = [
    Level {
        id: 21,
        title: "Level 21: Quantum Swap",
        sub_title: "System Optimization",
        description: "The main core is offline, but backup systems need optimization. Swap the power values of two quantum variables.",
        objective: "Variables `x = 10` and `y = 20`. Swap their values so `x` becomes 20 and `y` becomes 10. Print `x` and `y`.",
        seeds: SeedTemplates {
            default: "x = 10\ny = 20\n# Swap values of x and y\n\n# Print x, then y\n",
            easy: Some("x = 10\ny = 20\ntemp = x\nx = ___\ny = ___\nprint(x)\nprint(y)"),
            hard: None,
        },
        hint: "To swap without a temp variable in Python: x, y = y, x",
        exam: ExamQuestion {
            topic: "Swapping Variables",
            question: "Which statement swaps x and y in Python?",
            marks: 1,
            answer: "x, y = y, x",
        },
        validator: Validator::Custom(validate_swap),
        story_start: &[
            Line::with_mood(DrChen, "The system is running, but it's inefficient. We need to reroute the power flow.", Neutral),
            Line::with_mood(Adam, "Optimization required. Swap the polarities.", Neutral),
        ],
        story_end: &[Line::plain(System, "OPTIMIZATION COMPLETE. EFFICIENCY INCREASED BY 200%.")],
    },
    Level {
        id: 22,
        title: "Level 22: Decryption Protocol",
        sub_title: "Sector Lambda - Communications",
        description: "Enemy comms are encrypted with a simple substitution. We need to replace keywords to read the message.",
        objective: "Variable `msg = \"KRONOS_WIN\"`. Use the `.replace()` method to change \"WIN\" to \"FAIL\". Print the result.",
        seeds: SeedTemplates::only("msg = \"KRONOS_WIN\"\n# Use msg.replace(\"OLD\", \"NEW\")\n# Print result\n"),
        hint: "msg.replace(\"WIN\", \"FAIL\")",
        exam: ExamQuestion {
            topic: "String Methods (Replace)",
            question: "What does string.replace() return?",
            marks: 1,
            answer: "A new string with replaced values",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &[".replace(\"WIN\",\"FAIL\")"], "Method: Use .replace(\"WIN\", \"FAIL\")"),
                Check::has(Stripped, &["print("], "Output: Print the result."),
            ],
            success: "Message Decrypted.",
            output: "KRONOS_FAIL",
        },
        story_start: &[
            Line::with_mood(Cipher, "Intercepted a signal. It says they won?", Fear),
            Line::with_mood(Adam, "Rewrite their reality. Change the message.", Determined),
        ],
        story_end: &[Line::plain(System, "BROADCAST OVERWRITTEN.")],
    },
    Level {
        id: 23,
        title: "Level 23: Supply Chain",
        sub_title: "Sector Lambda - Logistics",
        description: "We need to stock up on supplies before moving forward.",
        objective: "List `inventory = [\"Gun\"]`. Use `.append()` to add \"Ammo\". Then print `inventory`.",
        seeds: SeedTemplates::only("inventory = [\"Gun\"]\n# Append \"Ammo\"\n# Print inventory\n"),
        hint: "inventory.append(\"Item\") adds an item to the end of the list.",
        exam: ExamQuestion {
            topic: "List Methods (Append)",
            question: "Which method adds an element to the end of a list?",
            marks: 1,
            answer: "append()",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &[".append(\"Ammo\")"], "Method: Use .append(\"Ammo\")"),
                Check::has(Stripped, &["print(inventory)"], "Output: Print inventory."),
            ],
            success: "Supplies Loaded.",
            output: "['Gun', 'Ammo']",
        },
        story_start: &[Line::with_mood(DrChen, "We're running low. Grab what you can.", Neutral)],
        story_end: &[Line::with_mood(Cipher, "Locked and loaded.", Determined)],
    },
    Level {
        id: 24,
        title: "Level 24: Grid Scan",
        sub_title: "Sector Mu - Mapping",
        description: "The sector map is a 2D grid. We need to scan every coordinate.",
        objective: "Write a nested loop. Outer loop `i` in `range(3)`, inner loop `j` in `range(3)`. Inside inner loop, print `i` and `j`.",
        seeds: SeedTemplates::only("# Outer loop i in range(3)\n    # Inner loop j in range(3)\n        # Print i, j\n"),
        hint: "Nest the second loop inside the first one's indentation block.",
        exam: ExamQuestion {
            topic: "Nested Loops",
            question: "How many times will the inner loop run in total if both loops range(3)?",
            marks: 1,
            answer: "9 times",
        },
        validator: Validator::Rules {
            checks: &[
                Check::occurs(Collapsed, "range(3)", 2, "Loops: Two loops range(3)."),
                Check::has(Stripped, &["print(i,j)"], "Output: Print i, j."),
            ],
            success: "Sector Mapped.",
            output: "0 0\n0 1\n...",
        },
        story_start: &[Line::with_mood(Adam, "We need a full topographical scan. Check every quadrant.", Neutral)],
        story_end: &[Line::plain(System, "MAP DATA UPDATED.")],
    },
    Level {
        id: 25,
        title: "Level 25: Clearance Update",
        sub_title: "Sector Nu - Security",
        description: "Your security clearance is outdated. Hack the database to upgrade it.",
        objective: "Dictionary `config = {\"power\": 50, \"level\": 1}`. Update the value of \"power\" to 100. Print `config`.",
        seeds: SeedTemplates::only("config = {\"power\": 50, \"level\": 1}\n# Set config[\"power\"] to 100\n# Print config\n"),
        hint: "dict_name[\"key\"] = new_value",
        exam: ExamQuestion {
            topic: "Updating Dictionaries",
            question: "Are dictionary keys mutable or immutable?",
            marks: 1,
            answer: "Immutable",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["config[\"power\"]=100"], "Logic: Set config[\"power\"] = 100"),
                Check::has(Stripped, &["print(config)"], "Output: Print config."),
            ],
            success: "Clearance Upgraded.",
            output: "{'power': 100, 'level': 1}",
        },
        story_start: &[
            Line::with_mood(Kronos, "INSUFFICIENT POWER LEVELS.", Glitch),
            Line::with_mood(Cipher, "Not for long.", Determined),
        ],
        story_end: &[Line::plain(System, "MAXIMUM POWER ACHIEVED.")],
    },
    Level {
        id: 26,
        title: "Level 26: Brute Force",
        sub_title: "Sector Xi - Gate 7",
        description: "The gate requires a password validation loop.",
        objective: "Variable `password = \"wrong\"`. Write a `while` loop that runs while `password != \"secret\"`. Inside, print \"Access Denied\" and then set `password = \"secret\"` to break the loop.",
        seeds: SeedTemplates::only("password = \"wrong\"\n# While password is not \"secret\"\n    # Print \"Access Denied\"\n    # Set password to \"secret\"\n"),
        hint: "while password != \"secret\":",
        exam: ExamQuestion {
            topic: "While Loop Logic",
            question: "What operator checks for inequality?",
            marks: 1,
            answer: "!=",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["whilepassword!=\"secret\":"], "Loop: Check password != \"secret\""),
                Check::has(Stripped, &["password=\"secret\""], "Logic: Update password inside loop."),
            ],
            success: "Password Cracked.",
            output: "Access Denied",
        },
        story_start: &[Line::with_mood(Adam, "Keep trying until the hash matches.", Neutral)],
        story_end: &[Line::plain(System, "PASSWORD ACCEPTED.")],
    },
    Level {
        id: 27,
        title: "Level 27: Targeting Vector",
        sub_title: "Sector Omicron - Turrets",
        description: "Configure the targeting computer with X and Y coordinates.",
        objective: "Define a function `target(x, y)` that prints the sum of `x` and `y`. Call `target(10, 20)`.",
        seeds: SeedTemplates::only("def target(x, y):\n    # Print x + y\n\n# Call target with 10, 20\n"),
        hint: "def func(a, b):",
        exam: ExamQuestion {
            topic: "Functions with Multiple Args",
            question: "Can a function have more than one parameter?",
            marks: 1,
            answer: "Yes",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["deftarget(x,y):"], "Def: target(x, y)"),
                Check::has(Stripped, &["print(x+y)"], "Logic: Print sum."),
                Check::has(Stripped, &["target(10,20)"], "Call: target(10, 20)"),
            ],
            success: "Vector Locked.",
            output: "30",
        },
        story_start: &[Line::with_mood(DrChen, "Triangulate the position!", Fear)],
        story_end: &[Line::with_mood(Cipher, "Target locked. Fire!", Determined)],
    },
    Level {
        id: 28,
        title: "Level 28: System Diagnostic",
        sub_title: "Sector Pi - Monitoring",
        description: "Check if the system energy is above the threshold.",
        objective: "Define `check(x)`. Return `True` if `x > 10` else `False`. Print the result of `check(15)`.",
        seeds: SeedTemplates::only("def check(x):\n    # If x > 10 return True\n    # Else return False\n\n# Print check(15)\n"),
        hint: "return x > 10",
        exam: ExamQuestion {
            topic: "Boolean Return Values",
            question: "What are the two Boolean values in Python?",
            marks: 1,
            answer: "True and False",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["defcheck(x):"], "Def: check(x)"),
                Check::has(Stripped, &["returnTrue", "x>10"], "Logic: Return boolean check."),
                Check::has(Stripped, &["print(check(15))"], "Output: Print check(15)."),
            ],
            success: "Systems Normal.",
            output: "True",
        },
        story_start: &[Line::with_mood(Adam, "Run a boolean diagnostic.", Neutral)],
        story_end: &[Line::plain(System, "DIAGNOSTIC POSITIVE.")],
    },
    Level {
        id: 29,
        title: "Level 29: Log Formatting",
        sub_title: "Sector Rho - Records",
        description: "Format the status logs for the archive using f-strings.",
        objective: "Variable `level = 5`. Print the string `\"Status: Level 5\"` using an f-string.",
        seeds: SeedTemplates::only("level = 5\n# Print f\"Status: Level {level}\"\n"),
        hint: "f\"Text {variable}\"",
        exam: ExamQuestion {
            topic: "F-Strings",
            question: "What prefix is used for formatted strings?",
            marks: 1,
            answer: "f",
        },
        validator: Validator::Rules {
            checks: &[Check::has(Collapsed, &["print(f\"Status: Level {level}\")"], "Syntax: Use f-string formatting.")],
            success: "Log Entry Saved.",
            output: "Status: Level 5",
        },
        story_start: &[Line::plain(System, "ARCHIVING DATA...")],
        story_end: &[Line::with_mood(Cipher, "Records updated.", Neutral)],
    },
    Level {
        id: 30,
        title: "Level 30: Recursive Purge",
        sub_title: "Sector Sigma - Core",
        description: "A virus is replicating. Use a recursive function to delete it layer by layer.",
        objective: "Define `purge(n)`. If `n <= 0` return. Print `n`. Call `purge(n-1)`. Call `purge(3)` to start.",
        seeds: SeedTemplates::only("def purge(n):\n    # If n <= 0 return\n    # Print n\n    # Call purge(n-1)\n\npurge(3)\n"),
        hint: "Recursion is a function calling itself.",
        exam: ExamQuestion {
            topic: "Recursion",
            question: "What is the base case in recursion?",
            marks: 1,
            answer: "The condition that stops the recursion.",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["defpurge(n):"], "Def: purge(n)"),
                Check::has(Stripped, &["print(n)"], "Output: Print n before recursing."),
                Check::has(Stripped, &["purge(n-1)"], "Logic: Recursive call purge(n-1)."),
                Check::has(Stripped, &["purge(3)"], "Call: Start with purge(3)."),
            ],
            success: "Virus Purged.",
            output: "3\n2\n1",
        },
        story_start: &[
            Line::with_mood(Kronos, "REPLICATING DEFENSE PROTOCOLS...", Glitch),
            Line::with_mood(Adam, "It's a fractal virus. We have to go deeper.", Determined),
        ],
        story_end: &[Line::plain(System, "THREAT ELIMINATED.")],
    },
    Level {
        id: 31,
        title: "Level 31: Entropy Injection",
        sub_title: "Sector Tau - RNG",
        description: "We need random noise to jam their sensors.",
        objective: "Import the `random` module. Generate a random number `n = random.randint(1, 100)`. Print `n`.",
        seeds: SeedTemplates::only("# Import random\n# Set n to random.randint(1, 100)\n# Print n\n"),
        hint: "import random",
        exam: ExamQuestion {
            topic: "Modules (Random)",
            question: "Which keyword imports a library?",
            marks: 1,
            answer: "import",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["import random"], "Import: import random"),
                Check::has(Stripped, &["random.randint(1,100)"], "Logic: random.randint(1, 100)"),
            ],
            success: "Noise Generated.",
            output: "42",
        },
        story_start: &[
            Line::with_mood(Cipher, "They're predicting my moves!", Fear),
            Line::with_mood(Adam, "Introduce chaos.", Neutral),
        ],
        story_end: &[Line::with_mood(Kronos, "PREDICTION ERROR. SIGNAL LOST.", Glitch)],
    },
    Level {
        id: 32,
        title: "Level 32: Fail-Safe",
        sub_title: "Sector Upsilon - Stabilizer",
        description: "The power core might divide by zero. Catch the error to prevent a crash.",
        objective: "Write a `try`/`except` block. Inside `try`, `print(1/0)`. Inside `except`, `print(\"Caught\")`.",
        seeds: SeedTemplates::only("# try:\n    # print(1/0)\n# except:\n    # print(\"Caught\")\n"),
        hint: "try: ... except: ...",
        exam: ExamQuestion {
            topic: "Exception Handling",
            question: "Which block catches errors?",
            marks: 1,
            answer: "except",
        },
        validator: Validator::Rules {
            checks: &[
                Check::matches(Quoted, r"(?m)^[ \t]*try[ \t]*:", "Structure: Use try/except."),
                Check::matches(Quoted, r"(?m)^[ \t]*except[ \t]*:", "Structure: Use try/except."),
                Check::has(Stripped, &["print(\"Caught\")"], "Output: Print 'Caught' in except block."),
            ],
            success: "Crash Averted.",
            output: "Caught",
        },
        story_start: &[
            Line::with_mood(System, "CRITICAL MATH ERROR DETECTED.", Fear),
            Line::with_mood(Adam, "Catch the exception before the kernel panics.", Determined),
        ],
        story_end: &[Line::with_mood(Cipher, "Stable. That was close.", Neutral)],
    },
    Level {
        id: 33,
        title: "Level 33: Drone Fabrication",
        sub_title: "Sector Phi - Assembly",
        description: "We need our own drone. Define the blueprint using a Class.",
        objective: "Define a class `Bot`. Inside, write `pass`. Create an instance `b = Bot()`. Print `b`.",
        seeds: SeedTemplates::only("class Bot:\n    pass\n\n# Create b = Bot()\n# Print b\n"),
        hint: "class Name:",
        exam: ExamQuestion {
            topic: "Classes and Objects",
            question: "What is a blueprint for creating objects called?",
            marks: 1,
            answer: "Class",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["class Bot:"], "Class: Define class Bot."),
                Check::has(Stripped, &["b=Bot()"], "Instance: Create b = Bot()."),
                Check::has(Stripped, &["print(b)"], "Output: Print b."),
            ],
            success: "Unit Assembled.",
            output: "<__main__.Bot object>",
        },
        story_start: &[Line::with_mood(Adam, "We can't fight them alone. Build an ally.", Neutral)],
        story_end: &[Line::plain(System, "NEW UNIT ONLINE.")],
    },
    Level {
        id: 34,
        title: "Level 34: Command Protocol",
        sub_title: "Sector Phi - AI Lab",
        description: "Give the drone a command method.",
        objective: "Inside class `Bot`, define method `scan(self)` that prints \"Scanning\". Create instance `b` and call `b.scan()`.",
        seeds: SeedTemplates::only("class Bot:\n    def scan(self):\n        # Print \"Scanning\"\n\n# Create b\n# Call b.scan()\n"),
        hint: "Methods need 'self' as the first argument.",
        exam: ExamQuestion {
            topic: "Class Methods",
            question: "What is the first parameter of a class method?",
            marks: 1,
            answer: "self",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["defscan(self):"], "Method: Define scan(self)."),
                Check::has(Stripped, &["print(\"Scanning\")"], "Logic: Print \"Scanning\" inside scan."),
                Check::has(Stripped, &["b.scan()"], "Call: b.scan()"),
            ],
            success: "Command Executed.",
            output: "Scanning",
        },
        story_start: &[Line::with_mood(Cipher, "It's built, but it's just sitting there.", Neutral)],
        story_end: &[Line::plain(System, "UNIT RESPONDING.")],
    },
    Level {
        id: 35,
        title: "Level 35: Friend or Foe",
        sub_title: "Sector Chi - Identification",
        description: "Identify friendly units in the area.",
        objective: "List `ids = [1, 5, 9]`. Use `if 5 in ids:` to check. If true, print \"Found\".",
        seeds: SeedTemplates::only("ids = [1, 5, 9]\n# Check if 5 in ids\n    # Print \"Found\"\n"),
        hint: "Use the 'in' keyword to check for membership.",
        exam: ExamQuestion {
            topic: "Membership Operators",
            question: "Which operator checks if a value exists in a list?",
            marks: 1,
            answer: "in",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["if 5 in ids:"], "Logic: Use 'if 5 in ids:'"),
                Check::has(Stripped, &["print(\"Found\")"], "Output: Print 'Found'"),
            ],
            success: "Ally Located.",
            output: "Found",
        },
        story_start: &[Line::plain(System, "UNKNOWN UNIT DETECTED.")],
        story_end: &[Line::with_mood(Cipher, "It's one of ours.", Determined)],
    },
    Level {
        id: 36,
        title: "Level 36: Sorting Priorities",
        sub_title: "Sector Psi - Task Manager",
        description: "The system is overwhelmed. Sort the tasks by priority ID.",
        objective: "List `nums = [3, 1, 2]`. Use `nums.sort()`. Print `nums`.",
        seeds: SeedTemplates::only("nums = [3, 1, 2]\n# Sort the list\n# Print list\n"),
        hint: "list.sort() sorts the list in place.",
        exam: ExamQuestion {
            topic: "Sorting Lists",
            question: "Does sort() create a new list or modify the existing one?",
            marks: 1,
            answer: "Modifies existing (In-place)",
        },
        validator: Validator::Rules {
            checks: &[Check::has(Stripped, &["nums.sort()"], "Method: nums.sort()")],
            success: "Priorities Reordered.",
            output: "[1, 2, 3]",
        },
        story_start: &[Line::with_mood(Adam, "Too many processes. Organize them.", Neutral)],
        story_end: &[Line::plain(System, "OPTIMAL ORDER ESTABLISHED.")],
    },
    Level {
        id: 37,
        title: "Level 37: Black Box",
        sub_title: "Sector Omega - Recorder",
        description: "Record the mission status to a file before we enter the final zone.",
        objective: "Open \"log.txt\" in write mode `\"w\"`. Write \"Entry\" to it. Close the file.",
        seeds: SeedTemplates::only("f = open(\"log.txt\", \"w\")\n# Write \"Entry\"\n# Close f\n"),
        hint: "f.write(\"Text\")",
        exam: ExamQuestion {
            topic: "File Writing",
            question: "Which mode is used to write to a file?",
            marks: 1,
            answer: "\"w\"",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["open(\"log.txt\",\"w\")"], "Open: Mode 'w'"),
                Check::has(Stripped, &[".write(\"Entry\")"], "Write: .write(\"Entry\")"),
                Check::has(Stripped, &[".close()"], "Close: .close()"),
            ],
            success: "Log Saved.",
            output: "",
        },
        story_start: &[Line::with_mood(Cipher, "If we don't make it, someone needs to know what happened.", Sad)],
        story_end: &[Line::plain(System, "RECORD SAVED.")],
    },
    Level {
        id: 38,
        title: "Level 38: Intel Retrieval",
        sub_title: "Sector Omega - Database",
        description: "Read the enemy's final defense plan from their database.",
        objective: "Open \"plan.txt\" in read mode `\"r\"`. Read content into `d`. Print `d`.",
        seeds: SeedTemplates::only("f = open(\"plan.txt\", \"r\")\n# Read into d\n# Print d\n"),
        hint: "d = f.read()",
        exam: ExamQuestion {
            topic: "File Reading",
            question: "Which method reads the entire file?",
            marks: 1,
            answer: "read()",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["open(\"plan.txt\",\"r\")"], "Open: Mode 'r'"),
                Check::has(Stripped, &["=f.read()"], "Read: f.read()"),
                Check::has(Stripped, &["print(d)"], "Output: Print content."),
            ],
            success: "Plans Downloaded.",
            output: "SECRET_PLAN",
        },
        story_start: &[Line::with_mood(Adam, "Know thy enemy.", Neutral)],
        story_end: &[Line::with_mood(Cipher, "I see their weakness.", Determined)],
    },
    Level {
        id: 39,
        title: "Level 39: Lambda Code",
        sub_title: "The Void",
        description: "A quick, anonymous function is needed to bypass the speed trap.",
        objective: "Create a lambda function `double = lambda x: x*2`. Print `double(5)`.",
        seeds: SeedTemplates::only("# Define lambda double\n# Print double(5)\n"),
        hint: "lambda arguments : expression",
        exam: ExamQuestion {
            topic: "Lambda Functions",
            question: "What keyword creates an anonymous function?",
            marks: 1,
            answer: "lambda",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["lambdax:x*2"], "Syntax: lambda x: x*2"),
                Check::has(Stripped, &["print(double(5))"], "Call: print(double(5))"),
            ],
            success: "Speed Trap Bypassed.",
            output: "10",
        },
        story_start: &[
            Line::with_mood(Kronos, "TOO SLOW.", Glitch),
            Line::with_mood(Adam, "Execute micro-functions.", Neutral),
        ],
        story_end: &[Line::plain(System, "VELOCITY INCREASED.")],
    },
    Level {
        id: 40,
        title: "Level 40: The Omega Logic",
        sub_title: "The Core - Inner Chamber",
        description: "The final barrier. Apply a patch to every 3rd node, scan the rest.",
        objective: "Loop `i` in `range(10)`. If `i % 3 == 0` print \"Patch\". Else print \"Scan\".",
        seeds: SeedTemplates::only("# Loop 10 times\n    # If i % 3 is 0, print \"Patch\"\n    # Else print \"Scan\"\n"),
        hint: "Modulo % 3 checks for multiples of 3.",
        exam: ExamQuestion {
            topic: "Complex Algorithms",
            question: "What is 9 % 3?",
            marks: 1,
            answer: "0",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["range(10)"], "Range: 10"),
                Check::has(Stripped, &["i%3==0"], "Logic: Modulo 3"),
                Check::has(Stripped, &["print(\"Patch\")"], "Output: Patch"),
            ],
            success: "Core Patched.",
            output: "Patch\nScan\n...",
        },
        story_start: &[
            Line::with_mood(Kronos, "I AM THE LOGIC. I AM THE CODE.", Glitch),
            Line::with_mood(Cipher, "Your logic is flawed.", Determined),
        ],
        story_end: &[Line::with_mood(Kronos, "CRITICAL ERROR. LOGIC COLLAPSE.", Glitch)],
    },
    Level {
        id: 41,
        title: "Level 41: Singularity",
        sub_title: "End of Line",
        description: "The final command. Restore the world.",
        objective: "Print \"Singularity Achieved\".",
        seeds: SeedTemplates::only("# The final line\n"),
        hint: "print()",
        exam: ExamQuestion {
            topic: "Completion",
            question: "End of Exam. Status?",
            marks: 1,
            answer: "Complete",
        },
        validator: Validator::Rules {
            checks: &[Check::has(Collapsed, &["print(\"Singularity Achieved\")"], "Print the final message.")],
            success: "WORLD RESTORED.",
            output: "Singularity Achieved",
        },
        story_start: &[Line::with_mood(Adam, "It is time, Cipher. Reboot the world.", Neutral)],
        story_end: &[
            Line::with_mood(Cipher, "It's done. We made it.", Neutral),
            Line::with_mood(DrChen, "Welcome home, kid.", Neutral),
        ],
    },
];
