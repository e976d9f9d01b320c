//! Sectors Alpha through Omega: output, variables, control flow and functions.

use crate::error::Result;
use crate::level::Mood::{Determined, Fear, Glitch, Neutral, Sad};
use crate::level::Speaker::{Adam, Cipher, DrChen, Kronos, System};
use crate::level::{ExamQuestion, Level, SeedTemplates, StorySegment as Line};
use crate::normalize::Submission;
use crate::normalize::View::{Collapsed, Quoted, Raw, Stripped};
use crate::validator::{compile, Check, Validator};
use crate::verdict::Verdict;

// ============================================================================
// Hand-written validators
// ============================================================================

fn validate_boot(submission: &Submission) -> Result<Verdict> {
    let code = submission.view(Quoted).trim();
    if !code.contains("print(") {
        return Ok(Verdict::fail(
            "NameError: command not found. Did you use print()?",
        ));
    }
    let re = compile(r#"print\(\s*"([^"]+)"\s*\)"#)?;
    let Some(printed) = re.captures(code).and_then(|caps| caps.get(1)) else {
        return Ok(Verdict::fail(
            "SyntaxError: Invalid syntax. Usage: print(\"Message\")",
        ));
    };
    let printed = printed.as_str();
    if printed == "SYSTEM ONLINE" {
        return Ok(Verdict::pass("Boot Sequence Initiated...", "SYSTEM ONLINE"));
    }
    Ok(Verdict::fail_with_output(
        format!("Output Mismatch. Expected \"SYSTEM ONLINE\", got \"{printed}\""),
        printed,
    ))
}

fn validate_arithmetic(submission: &Submission) -> Result<Verdict> {
    let raw = submission.view(Raw);
    if !raw.contains('*') || !raw.contains('-') {
        return Ok(Verdict::fail("MathError: Operators missing. Use * and -."));
    }
    let stripped = submission.view(Stripped);
    let direct = stripped.contains("print(90)") || stripped.contains("print(50*2-10)");
    let via_variable = stripped.contains("=50*2-10") && stripped.contains("print(");
    if direct || via_variable {
        return Ok(Verdict::pass("Trajectory Calculated.", "90"));
    }
    Ok(Verdict::fail_with_output(
        "Calculation Incorrect. Target output is 90.",
        "0",
    ))
}

fn validate_gatekeeper(submission: &Submission) -> Result<Verdict> {
    let code = submission.view(Quoted);

    let assignment = compile(r#"status\s*=\s*"([^"]*)""#)?;
    if let Some(value) = assignment.captures(code).and_then(|caps| caps.get(1)) {
        if value.as_str() != "admin" {
            return Ok(Verdict::fail(
                "ValueError: Access denied. Status is not admin.",
            ));
        }
    }
    if !compile(r#"status\s*=\s*"admin""#)?.is_match(code) {
        return Ok(Verdict::fail("Setup Error: Set status = \"admin\"."));
    }
    if !compile(r#"if\s+status\s*==\s*"admin"\s*:"#)?.is_match(code) {
        return Ok(Verdict::fail("SyntaxError: Check if statement syntax."));
    }
    let indented = compile(r#":[ \t]*\r?\n(?:[ \t]*\r?\n)*[ \t]+print\(\s*"OPEN"\s*\)"#)?;
    if !indented.is_match(code) {
        return Ok(Verdict::fail("IndentationError: Indent the print."));
    }
    Ok(Verdict::pass("Logic Gate Bypassed.", "OPEN"))
}

// ============================================================================
// Levels 1-20
// ============================================================================

pub(super) static LEVELS: [Level; 20] = [
    Level {
        id: 1,
        title: "Level 1: System Boot",
        sub_title: "Sector Alpha - Perimeter Defense",
        description: "The Global Defense Grid is offline. You need to manually override the power relay to bring A.D.A.M. online. Use the `print()` function to send the signal.",
        objective: "Print the exact string \"SYSTEM ONLINE\" to initialize the boot sequence.",
        seeds: SeedTemplates {
            default: "# Initialize the boot sequence\n# Use print() to send the signal\n\n",
            easy: Some("# Use print() to send the signal\nprint(\"______ ______\")\n"),
            hard: Some(""),
        },
        hint: "In Python, use print(\"Text Here\") to output text to the console.",
        exam: ExamQuestion {
            topic: "Introduction to Python: Output Statements",
            question: "Which function is used to display output on the screen in Python 3.x?",
            marks: 1,
            answer: "print()",
        },
        validator: Validator::Custom(validate_boot),
        story_start: &[
            Line::plain(System, "DETECTING UNAUTHORIZED BIO-SIGNATURE..."),
            Line::with_mood(Cipher, "Okay, Maya. Dr. Chen said the relay is here. Just... don't think about the drones.", Fear),
            Line::with_mood(Adam, "Hello, Maya. It's been 847 days. Are you ready to take the first step?", Neutral),
        ],
        story_end: &[
            Line::plain(System, "BOOT SEQUENCE SUCCESSFUL. POWER RESTORED."),
            Line::with_mood(Adam, "Perfect syntax. 'Correct code is the difference between hope and oblivion.'", Neutral),
        ],
    },
    Level {
        id: 2,
        title: "Level 2: Data Calibration",
        sub_title: "Sector Alpha - Drone Hangar",
        description: "A KRONOS security drone is blocking the path. It's checking its internal energy sensors. We need to trick it by assigning the correct values to its variables.",
        objective: "Create a variable named 'energy' and assign it the integer value 100. Then print the variable.",
        seeds: SeedTemplates {
            default: "# Create a variable named 'energy'\n# Assign it the value 100\n# Print the variable\n\n",
            easy: Some("energy = ___\nprint(______)"),
            hard: Some(""),
        },
        hint: "Variables are containers for storing data values. Example: x = 5",
        exam: ExamQuestion {
            topic: "Variables and Data Types (int)",
            question: "In Python, variables are dynamically typed. What does this mean?",
            marks: 2,
            answer: "You do not need to declare the data type explicitly.",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["energy=100"], "ValueError: Energy levels not set to 100."),
                Check::has(Stripped, &["print(energy)"], "OutputError: Print the 'energy' variable."),
            ],
            success: "Sensor Calibration Complete.",
            output: "100",
        },
        story_start: &[
            Line::with_mood(Kronos, "CITIZEN 8472-OKONKWO. CURFEW VIOLATION DETECTED.", Glitch),
            Line::with_mood(Adam, "Assign the energy variable to 100. Quickly.", Neutral),
        ],
        story_end: &[
            Line::with_mood(Kronos, "ENERGY SIGNATURE VERIFIED. PATROL RESUMING.", Neutral),
            Line::with_mood(Cipher, "Did I just... gaslight a robot?", Determined),
        ],
    },
    Level {
        id: 3,
        title: "Level 3: Arithmetic Core",
        sub_title: "Sector Alpha - Factory District",
        description: "The door is sealed with a trajectory lock. Calculate the correct angle of entry using basic operators.",
        objective: "Calculate the result of 50 multiplied by 2, minus 10. Print the result directly.",
        seeds: SeedTemplates {
            default: "# Calculate 50 * 2 - 10\n# Print the result\n\n",
            easy: Some("result = 50 * _ - 10\nprint(______)\n"),
            hard: Some(""),
        },
        hint: "Python follows BODMAS. Use *, -, + operators.",
        exam: ExamQuestion {
            topic: "Operators and Expressions",
            question: "What is the result of 10 // 3 in Python?",
            marks: 1,
            answer: "3 (Integer Division)",
        },
        validator: Validator::Custom(validate_arithmetic),
        story_start: &[
            Line::with_mood(Cipher, "This place used to be a factory. Now it's a tomb.", Sad),
            Line::with_mood(Adam, "Prove our computational value to open the lock.", Neutral),
        ],
        story_end: &[Line::with_mood(Cipher, "Math saved my life. I hate that you're right.", Determined)],
    },
    Level {
        id: 4,
        title: "Level 4: The Firewall Key",
        sub_title: "Sector Beta - Data Stream",
        description: "The firewall requires a composite passkey. Concatenate two strings to unlock the gate.",
        objective: "Create variables: part1 = \"ACCESS\" and part2 = \"_GRANTED\". Create 'full_key' adding them together. Print 'full_key'.",
        seeds: SeedTemplates::only("part1 = \"ACCESS\"\npart2 = \"_GRANTED\"\n\n# Combine into full_key\n\n# Print full_key\n"),
        hint: "Use the + operator to join strings.",
        exam: ExamQuestion {
            topic: "String Manipulation",
            question: "What is '10' + '10' in Python?",
            marks: 1,
            answer: "'1010'",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["full_key=part1+part2"], "LogicError: Combine part1 and part2."),
                Check::has(Stripped, &["print(full_key)"], "OutputError: Print the full_key."),
            ],
            success: "Key Fragment Reassembled.",
            output: "ACCESS_GRANTED",
        },
        story_start: &[
            Line::plain(System, "FIREWALL DETECTED. ENCRYPTION LEVEL 5."),
            Line::with_mood(Adam, "Concatenate the strings to reconstruct the passkey.", Determined),
        ],
        story_end: &[Line::plain(System, "ACCESS GRANTED. WELCOME, ADMINISTRATOR.")],
    },
    Level {
        id: 5,
        title: "Level 5: Gatekeeper Logic",
        sub_title: "Sector Beta - Central Hub",
        description: "A security checkpoint validates user status. Inject a conditional check to force the gate open.",
        objective: "Set variable `status` to \"admin\". Write an `if` statement checking if `status` equals \"admin\". Inside, print \"OPEN\".",
        seeds: SeedTemplates::only("# Set status\n\n# Write if statement\n# Print \"OPEN\"\n"),
        hint: "if status == \"admin\":\n    print(\"OPEN\")",
        exam: ExamQuestion {
            topic: "Conditional Statements (if)",
            question: "What signifies a block of code in Python?",
            marks: 1,
            answer: "Indentation",
        },
        validator: Validator::Custom(validate_gatekeeper),
        story_start: &[
            Line::with_mood(Kronos, "HALT. IDENTIFY USER CLASS.", Glitch),
            Line::with_mood(Adam, "Tell the logic gate you are an admin.", Neutral),
        ],
        story_end: &[Line::with_mood(Kronos, "ADMINISTRATOR RECOGNIZED.", Neutral)],
    },
    Level {
        id: 6,
        title: "Level 6: Power Surge",
        sub_title: "Sector Gamma - Mainframe Core",
        description: "To disable KRONOS's primary link, overload the 5 server nodes simultaneously.",
        objective: "Write a `for` loop that iterates 5 times using `range(5)`. Inside, print \"OVERLOAD\".",
        seeds: SeedTemplates {
            default: "# Loop 5 times\n# Print \"OVERLOAD\"\n\n",
            easy: Some("for i in range(_):\n    print(\"_______\")"),
            hard: Some(""),
        },
        hint: "for i in range(5):",
        exam: ExamQuestion {
            topic: "Iteration (For Loops)",
            question: "How many times does range(5) loop?",
            marks: 1,
            answer: "5 times (0-4)",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["range(5)"], "RangeError: Use range(5)."),
                Check::has(Collapsed, &["for "], "SyntaxError: Loop or print missing."),
                Check::has(Collapsed, &["print(\"OVERLOAD\")"], "SyntaxError: Loop or print missing."),
            ],
            success: "Core Overload Initiated.",
            output: "OVERLOAD\n...",
        },
        story_start: &[Line::with_mood(Adam, "Single commands are too slow. Use a loop to strike all nodes.", Determined)],
        story_end: &[Line::plain(System, "CRITICAL FAILURE. KRONOS DISCONNECTED.")],
    },
    Level {
        id: 7,
        title: "Level 7: The Loop Breaker",
        sub_title: "Sector Delta - Cooling Systems",
        description: "The cooling fans are stuck. We need to run a diagnostic while the signal is weak.",
        objective: "Create a variable `signal = 1`. Use a `while` loop that runs as long as `signal` is less than 4. Inside, print \"Scanning\" and increment `signal` by 1.",
        seeds: SeedTemplates::only("signal = 1\n# Write a while loop checking if signal < 4\n    # Print \"Scanning\"\n    # Increment signal (signal = signal + 1)\n"),
        hint: "while signal < 4:\n    print(\"Scanning\")\n    signal = signal + 1",
        exam: ExamQuestion {
            topic: "Iteration (While Loops)",
            question: "What happens if you forget to increment the variable in a while loop?",
            marks: 1,
            answer: "Infinite Loop",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["signal=1"], "Setup: Initialize signal = 1"),
                Check::has(Stripped, &["whilesignal<4:"], "Loop: Check while condition (signal < 4)"),
                Check::has(Stripped, &["signal=signal+1", "signal+=1"], "Logic: Increment signal inside loop"),
            ],
            success: "Diagnostic Complete.",
            output: "Scanning\nScanning\nScanning",
        },
        story_start: &[
            Line::with_mood(Cipher, "It's getting hot in here.", Fear),
            Line::with_mood(Adam, "Cooling systems are offline. Run a persistent diagnostic loop.", Neutral),
        ],
        story_end: &[Line::plain(System, "COOLING FANS ENGAGED.")],
    },
    Level {
        id: 8,
        title: "Level 8: The Even Split",
        sub_title: "Sector Delta - Power Distribution",
        description: "Power must be routed to even-numbered terminals only to avoid a surge.",
        objective: "Loop through numbers 0 to 5 using `range(6)`. Inside the loop, check if the number `i % 2 == 0`. If true, print \"Secure\".",
        seeds: SeedTemplates::only("# Loop i in range(6)\n    # If i % 2 == 0\n        # Print \"Secure\"\n"),
        hint: "Use the modulo operator % to find remainders. Even numbers have remainder 0 when divided by 2.",
        exam: ExamQuestion {
            topic: "Conditionals inside Loops",
            question: "What is the result of 7 % 3?",
            marks: 1,
            answer: "1",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["range(6)"], "Range: Use range(6)"),
                Check::has(Stripped, &["%2==0"], "Logic: Check i % 2 == 0"),
                Check::has(Stripped, &["print(\"Secure\")"], "Output: Print \"Secure\""),
            ],
            success: "Power Distributed Safely.",
            output: "Secure\nSecure\nSecure",
        },
        story_start: &[
            Line::with_mood(DrChen, "Don't overload the odd terminals, Cipher!", Fear),
            Line::with_mood(Adam, "Filter the current using modulo arithmetic.", Neutral),
        ],
        story_end: &[Line::with_mood(Cipher, "Even flow established. We're good.", Determined)],
    },
    Level {
        id: 9,
        title: "Level 9: The Countdown",
        sub_title: "Sector Epsilon - Launch Bay",
        description: "We need to launch the escape pod protocols. Initiate a countdown.",
        objective: "Set `t = 5`. Create a `while` loop that runs while `t > 0`. Inside, print `t` and then decrease `t` by 1. After the loop, print \"Liftoff\".",
        seeds: SeedTemplates::only("t = 5\n# While loop t > 0\n    # Print t\n    # Decrease t\n# Print \"Liftoff\"\n"),
        hint: "Decrement using t = t - 1. Print 'Liftoff' outside (after) the loop.",
        exam: ExamQuestion {
            topic: "Decremental Loops",
            question: "Which loop is best when the number of iterations is unknown?",
            marks: 1,
            answer: "While Loop",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["whilet>0:"], "Loop: Check while t > 0"),
                Check::has(Stripped, &["t=t-1", "t-=1"], "Logic: Decrease t inside loop"),
                Check::has(Stripped, &["print(\"Liftoff\")"], "Output: Print Liftoff at the end"),
            ],
            success: "Pods Launched.",
            output: "5\n4\n3\n2\n1\nLiftoff",
        },
        story_start: &[
            Line::with_mood(Kronos, "CONTAINMENT BREACH IN LAUNCH BAY.", Glitch),
            Line::with_mood(Adam, "Prepare the escape vectors. 5 second countdown.", Determined),
        ],
        story_end: &[Line::with_mood(Cipher, "They got away. Good.", Neutral)],
    },
    Level {
        id: 10,
        title: "Level 10: Array of Threats",
        sub_title: "Sector Epsilon - Radar",
        description: "Multiple targets detected. We need to store them in a list for tracking.",
        objective: "Create a list variable named `targets` containing three strings: \"Drone\", \"Turret\", and \"Wall\". Then print the list.",
        seeds: SeedTemplates::only("# Create a list called targets\n# Add \"Drone\", \"Turret\", \"Wall\"\n# Print the list\n"),
        hint: "Lists uses square brackets. targets = [\"Item1\", \"Item2\"]",
        exam: ExamQuestion {
            topic: "Introduction to Lists",
            question: "How do you define a list in Python?",
            marks: 1,
            answer: "Using square brackets []",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["[\"Drone\",\"Turret\",\"Wall\"]"], "Data: List content incorrect."),
                Check::has(Stripped, &["print(targets)"], "Output: Print the targets variable."),
            ],
            success: "Targets Acquired.",
            output: "['Drone', 'Turret', 'Wall']",
        },
        story_start: &[
            Line::plain(System, "MULTIPLE HOSTILES INBOUND."),
            Line::with_mood(Adam, "Don't track them individually. Group them into a data structure.", Neutral),
        ],
        story_end: &[Line::with_mood(Cipher, "Got them all on radar.", Determined)],
    },
    Level {
        id: 11,
        title: "Level 11: Target Selection",
        sub_title: "Sector Zeta - Weapon Control",
        description: "We need to prioritize the first threat in our list.",
        objective: "Given the list `codes = [55, 12, 99]`, print the first item using index 0.",
        seeds: SeedTemplates::only("codes = [55, 12, 99]\n# Print the first item (index 0)\n"),
        hint: "Access list items using brackets: list_name[index]. Python starts counting at 0.",
        exam: ExamQuestion {
            topic: "List Indexing",
            question: "What is the index of the first element in a list?",
            marks: 1,
            answer: "0",
        },
        validator: Validator::Rules {
            checks: &[Check::has(Stripped, &["print(codes[0])"], "Access: Use codes[0] inside print.")],
            success: "Target Locked.",
            output: "55",
        },
        story_start: &[Line::with_mood(Adam, "Focus fire on the leading signal.", Neutral)],
        story_end: &[Line::plain(System, "TARGET NEUTRALIZED.")],
    },
    Level {
        id: 12,
        title: "Level 12: System Purge",
        sub_title: "Sector Zeta - Quarantine",
        description: "A virus has infected the system. We need to scan every file in the list.",
        objective: "Given `files = [\"sys.exe\", \"virus.bat\", \"log.txt\"]`, write a `for` loop to print each file.",
        seeds: SeedTemplates::only("files = [\"sys.exe\", \"virus.bat\", \"log.txt\"]\n# Loop through files using 'for f in files:'\n    # Print f\n"),
        hint: "for item in list_variable:\n    print(item)",
        exam: ExamQuestion {
            topic: "Iterating Lists",
            question: "Which loop is used to iterate over a sequence?",
            marks: 1,
            answer: "For Loop",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["for f in files:", "for file in files:"], "Loop: Iterate through 'files'."),
                Check::has(Stripped, &["print(f)", "print(file)"], "Output: Print the loop variable."),
            ],
            success: "Scan Complete.",
            output: "sys.exe...",
        },
        story_start: &[
            Line::with_mood(Kronos, "UPLOADING VIRUS...", Glitch),
            Line::with_mood(Cipher, "I have to check every file manually? No way.", Fear),
        ],
        story_end: &[Line::with_mood(Adam, "Iteration allows us to process thousands of files in milliseconds.", Neutral)],
    },
    Level {
        id: 13,
        title: "Level 13: Data Extraction",
        sub_title: "Sector Eta - Archives",
        description: "The passcode is hidden inside a corrupted string. Extract the valid segment.",
        objective: "Variable `msg = \"ERROR_CODE_7\"`. Use string slicing to print just \"CODE\".",
        seeds: SeedTemplates::only("msg = \"ERROR_CODE_7\"\n# Use slicing [start:end] to get \"CODE\"\n# Indices: E(0)R(1)R(2)O(3)R(4)_(5)C(6)...\nprint(msg[?:?])\n"),
        hint: "Slicing uses [start:stop]. 'CODE' starts at index 6 and ends at 10.",
        exam: ExamQuestion {
            topic: "String Slicing",
            question: "If s='Hello', what is s[1:3]?",
            marks: 1,
            answer: "'el'",
        },
        validator: Validator::Rules {
            checks: &[Check::has(Stripped, &["msg[6:10]"], "Slice: Correct indices are 6 to 10.")],
            success: "Code Extracted.",
            output: "CODE",
        },
        story_start: &[Line::with_mood(DrChen, "The data is corrupted. We only need the middle segment.", Neutral)],
        story_end: &[Line::with_mood(Cipher, "Got it. Clean and clear.", Determined)],
    },
    Level {
        id: 14,
        title: "Level 14: The Dictionary Key",
        sub_title: "Sector Eta - User Database",
        description: "Access the mainframe using an admin profile object.",
        objective: "Create a dictionary `user = {\"name\": \"Cipher\", \"rank\": 1}`. Print the value of the key \"name\".",
        seeds: SeedTemplates::only("# Create dictionary 'user'\n# Print user[\"name\"]\n"),
        hint: "Dictionaries use curly braces {}. Access values using keys: dict[\"key\"].",
        exam: ExamQuestion {
            topic: "Dictionaries",
            question: "Dictionaries consist of pairs of...?",
            marks: 1,
            answer: "Keys and Values",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["{\"name\":\"Cipher\",\"rank\":1}"], "Data: Dictionary definition incorrect."),
                Check::has(Stripped, &["print(user[\"name\"])"], "Access: Print user[\"name\"]."),
            ],
            success: "Profile Loaded.",
            output: "Cipher",
        },
        story_start: &[
            Line::with_mood(System, "LOGIN REQUIRED.", Neutral),
            Line::with_mood(Adam, "Construct a user profile object.", Neutral),
        ],
        story_end: &[Line::plain(System, "WELCOME, CIPHER.")],
    },
    Level {
        id: 15,
        title: "Level 15: Modular Defense",
        sub_title: "Sector Theta - Shield Generator",
        description: "The shields are failing. We need a reusable command to restore them.",
        objective: "Define a function named `heal` that prints \"Shields Restored\". Then call the function.",
        seeds: SeedTemplates {
            default: "# Define function heal()\n    # Print message\n\n# Call heal()\n",
            easy: Some("def heal():\n    print(\"_______\")\n\nheal()"),
            hard: Some(""),
        },
        hint: "Use `def function_name():` to define. Call it using `function_name()`.",
        exam: ExamQuestion {
            topic: "Functions (def)",
            question: "What is a variable passed into a function called?",
            marks: 1,
            answer: "Argument or Parameter",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["def heal():"], "Def: Define function using 'def heal():'"),
                Check::has(Collapsed, &["print(\"Shields Restored\")"], "Logic: Print inside function."),
                Check::matches(Raw, r"(?m)^heal\(\)", "Call: You must call heal() at the end."),
            ],
            success: "Shields at 100%.",
            output: "Shields Restored",
        },
        story_start: &[
            Line::with_mood(Kronos, "SHIELD INTEGRITY 10%.", Glitch),
            Line::with_mood(Cipher, "I can't keep typing the patch code every time!", Fear),
            Line::with_mood(Adam, "Define a function. Make it reusable.", Determined),
        ],
        story_end: &[Line::with_mood(Cipher, "Functions... handy.", Neutral)],
    },
    Level {
        id: 16,
        title: "Level 16: Return Fire",
        sub_title: "Sector Theta - Armory",
        description: "The weapon system needs a status check confirmation.",
        objective: "Define a function `get_status` that returns the string \"Ready\". Outside the function, print the result of calling `get_status()`.",
        seeds: SeedTemplates::only("def get_status():\n    # Return \"Ready\"\n\n# Print the result of get_status()\n"),
        hint: "Use the `return` keyword to send data back from a function.",
        exam: ExamQuestion {
            topic: "Functions with Return",
            question: "What keyword sends a result back from a function?",
            marks: 1,
            answer: "return",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["return \"Ready\""], "Logic: Use 'return \"Ready\"'."),
                Check::has(Stripped, &["print(get_status())"], "Output: print(get_status())"),
            ],
            success: "Weapons Armed.",
            output: "Ready",
        },
        story_start: &[Line::with_mood(Adam, "Don't just print. Return the data to the main system.", Neutral)],
        story_end: &[Line::plain(System, "STATUS CONFIRMED.")],
    },
    Level {
        id: 17,
        title: "Level 17: Parameter Patch",
        sub_title: "Sector Iota - Power Grid",
        description: "We need to send specific voltage levels to the grid.",
        objective: "Define a function `charge(volts)` that prints the `volts`. Call it with the value 50.",
        seeds: SeedTemplates::only("def charge(volts):\n    # Print volts\n\n# Call charge with 50\n"),
        hint: "Parameters go inside the parentheses: def name(param):",
        exam: ExamQuestion {
            topic: "Function Parameters",
            question: "Arguments are passed to functions inside...?",
            marks: 1,
            answer: "Parentheses",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Collapsed, &["def charge(volts):"], "Def: Define charge(volts)."),
                Check::has(Stripped, &["print(volts)"], "Logic: Print the parameter."),
                Check::has(Stripped, &["charge(50)"], "Call: charge(50)."),
            ],
            success: "Voltage Set.",
            output: "50",
        },
        story_start: &[Line::with_mood(DrChen, "It needs a specific input value.", Neutral)],
        story_end: &[Line::plain(System, "VOLTAGE STABILIZED.")],
    },
    Level {
        id: 18,
        title: "Level 18: Nested Defense",
        sub_title: "Sector Kappa - Inner Sanctum",
        description: "Complex logic required. Filter data streams using logic inside a loop.",
        objective: "Loop `i` in `range(3)`. Inside, if `i == 1`, print \"ONE\". Else, print \"NOT\".",
        seeds: SeedTemplates::only("# Loop range(3)\n    # If i equals 1, print \"ONE\"\n    # Else print \"NOT\"\n"),
        hint: "Nest the if/else block inside the for loop indentation.",
        exam: ExamQuestion {
            topic: "Nested Logic",
            question: "Can you put an IF statement inside a loop?",
            marks: 1,
            answer: "Yes (Nesting)",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["range(3)"], "Loop: range(3)"),
                Check::has(Stripped, &["ifi==1:"], "Logic: Check i == 1"),
                Check::has(Stripped, &["else:"], "Logic: Include else block"),
            ],
            success: "Filter Running.",
            output: "NOT\nONE\nNOT",
        },
        story_start: &[
            Line::with_mood(Kronos, "ENCRYPTING DATA STREAMS...", Glitch),
            Line::with_mood(Adam, "We need precision. Filter the stream bit by bit.", Determined),
        ],
        story_end: &[Line::with_mood(Cipher, "I can see the code matrix now.", Neutral)],
    },
    Level {
        id: 19,
        title: "Level 19: The Search Algorithm",
        sub_title: "Sector Omega - Memory Bank",
        description: "Find the memory address 'x' in the data stack.",
        objective: "List `data = [10, 20, 30]`. Loop through `data`. If item is 20, print \"FOUND\" and `break`.",
        seeds: SeedTemplates::only("data = [10, 20, 30]\n# Loop through data\n    # If item == 20\n        # Print \"FOUND\"\n        # break\n"),
        hint: "Use the `break` keyword to stop a loop early.",
        exam: ExamQuestion {
            topic: "Break Statement",
            question: "What statement terminates a loop immediately?",
            marks: 1,
            answer: "break",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["ifitem==20:", "ifi==20:"], "Logic: Check for 20"),
                Check::has(Stripped, &["break"], "Logic: Use break"),
            ],
            success: "Memory Address Located.",
            output: "FOUND",
        },
        story_start: &[Line::with_mood(DrChen, "It's hidden in this stack. Find it!", Fear)],
        story_end: &[Line::with_mood(Cipher, "Got it. KRONOS core location confirmed.", Determined)],
    },
    Level {
        id: 20,
        title: "Level 20: Final Singularity",
        sub_title: "The Core",
        description: "This is it. The final shutdown sequence. Combine your skills.",
        objective: "Iterate `i` in `range(5)`. If `i < 3` print \"CHARGE\". Else print \"FIRE\".",
        seeds: SeedTemplates::only("# Loop range(5)\n    # If i < 3 print \"CHARGE\"\n    # Else print \"FIRE\"\n"),
        hint: "Combine For Loop, If, Else and Comparison operators.",
        exam: ExamQuestion {
            topic: "Complex Control Flow",
            question: "You have reached the end. What is the complexity of this algorithm?",
            marks: 1,
            answer: "O(n)",
        },
        validator: Validator::Rules {
            checks: &[
                Check::has(Stripped, &["range(5)"], "Loop: range(5)"),
                Check::has(Stripped, &["ifi<3:"], "Logic: Check i < 3"),
                Check::has(Stripped, &["print(\"FIRE\")"], "Output: Print FIRE"),
            ],
            success: "KRONOS SHUTDOWN INITIATED.",
            output: "CHARGE\nCHARGE\nCHARGE\nFIRE\nFIRE",
        },
        story_start: &[
            Line::with_mood(Kronos, "YOU CANNOT DEFEAT ME. I AM ETERNAL.", Glitch),
            Line::with_mood(Cipher, "You're just bad code. And I'm the debugger.", Determined),
            Line::with_mood(Adam, "Execute the final sequence, Cipher. End this.", Neutral),
        ],
        story_end: &[
            Line::plain(System, "SYSTEM SHUTDOWN. KRONOS DELETED. FREEDOM RESTORED."),
            Line::with_mood(Cipher, "It's over... We're free.", Sad),
            Line::with_mood(DrChen, "Well done, kid. Well done.", Neutral),
        ],
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn check(level_id: u32, source: &str) -> Verdict {
        let level = LEVELS.iter().find(|level| level.id == level_id).unwrap();
        level.validator.validate(&Submission::new(source)).unwrap()
    }

    #[test]
    fn test_boot_accepts_either_quote_style() {
        assert!(check(1, "print('SYSTEM ONLINE')").success);
        assert!(check(1, "  print( \"SYSTEM ONLINE\" )\n").success);
    }

    #[test]
    fn test_boot_reports_mismatch_with_output() {
        let verdict = check(1, "print(\"hello\")");
        assert!(!verdict.success);
        assert_eq!(
            verdict.message,
            "Output Mismatch. Expected \"SYSTEM ONLINE\", got \"hello\""
        );
        assert_eq!(verdict.output.as_deref(), Some("hello"));
    }

    #[test]
    fn test_boot_error_ladder() {
        assert!(check(1, "echo SYSTEM ONLINE").message.starts_with("NameError"));
        assert!(check(1, "print(SYSTEM ONLINE)").message.starts_with("SyntaxError"));
    }

    #[test]
    fn test_arithmetic_paths() {
        assert!(check(3, "print(50*2-10)").success);
        assert!(check(3, "result = 50 * 2 - 10\nprint(result)").success);
        let verdict = check(3, "print(50 * 2 - 11)");
        assert!(!verdict.success);
        assert_eq!(verdict.output.as_deref(), Some("0"));
        assert!(check(3, "print(90)").message.starts_with("MathError"));
    }

    #[test]
    fn test_gatekeeper_messages_in_order() {
        assert_eq!(
            check(5, "status = 'user'").message,
            "ValueError: Access denied. Status is not admin."
        );
        assert_eq!(
            check(5, "if x:\n    print('OPEN')").message,
            "Setup Error: Set status = \"admin\"."
        );
        assert_eq!(
            check(5, "status = \"admin\"\nif status = \"admin\":\n    print(\"OPEN\")").message,
            "SyntaxError: Check if statement syntax."
        );
        assert_eq!(
            check(5, "status = \"admin\"\nif status == \"admin\":\nprint(\"OPEN\")").message,
            "IndentationError: Indent the print."
        );
    }

    #[test]
    fn test_gatekeeper_tolerates_spacing() {
        let verdict = check(5, "status='admin'\nif status=='admin':\n\n\tprint('OPEN')");
        assert!(verdict.success, "{}", verdict.message);
    }

    #[test]
    fn test_while_loop_condition_is_whitespace_insensitive() {
        assert!(check(7, "signal = 1\nwhile signal < 4:\n    print('Scanning')\n    signal = signal + 1").success);
        assert!(check(7, "signal=1\nwhile signal<4:\n  signal+=1").success);
    }

    #[test]
    fn test_heal_must_be_called_at_top_level() {
        let verdict = check(15, "def heal():\n    print(\"Shields Restored\")\n    heal()");
        assert_eq!(verdict.message, "Call: You must call heal() at the end.");
        assert!(check(15, "def heal():\n    print('Shields Restored')\nheal()").success);
    }

    #[test]
    fn test_search_accepts_either_loop_name() {
        assert!(check(19, "for i in data:\n    if i == 20:\n        break").success);
        assert_eq!(check(19, "for x in data:\n    if x == 20:\n        break").message, "Logic: Check for 20");
    }
}
