//! Four-tier hint ladders.
//!
//! Tier 1 is conceptual, tier 2 syntactic, tier 3 a partial answer and tier 4
//! the full solution, prefixed with `Solution:`. The solution text is what the
//! auto-solve action loads into the editor, so every tier-4 entry must pass
//! its own level's validator; the catalog checks this on assembly.

use serde::Serialize;

use crate::error::{Result, SingularityError};

/// Prefix marking the tier-4 text as a solution.
pub const SOLUTION_PREFIX: &str = "Solution:";

/// Hints for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HintSet {
    /// Level the hints belong to.
    pub level_id: u32,
    /// Tier texts, index 0 is tier 1.
    pub tiers: [&'static str; 4],
}

impl HintSet {
    /// Returns the text for a tier between 1 and 4.
    pub fn tier(&self, tier: u8) -> Result<&'static str> {
        match tier {
            1..=4 => Ok(self.tiers[usize::from(tier - 1)]),
            _ => Err(SingularityError::InvalidHintTier { tier }),
        }
    }

    /// Returns the tier-4 solution with its prefix removed.
    #[must_use]
    pub fn solution(&self) -> &'static str {
        let text = self.tiers[3];
        text.strip_prefix(SOLUTION_PREFIX).unwrap_or(text).trim()
    }
}

const fn hints(level_id: u32, tiers: [&'static str; 4]) -> HintSet {
    HintSet { level_id, tiers }
}

/// The shipped hint table, ordered by level.
pub static HINTS: [HintSet; 41] = [
    hints(1, [
        "Use print()",
        "print(\"Text\")",
        "print(\"SYSTEM ONLINE\")",
        "Solution: print(\"SYSTEM ONLINE\")",
    ]),
    hints(2, [
        "energy = value",
        "energy = 100",
        "print(energy)",
        "Solution:\nenergy = 100\nprint(energy)",
    ]),
    hints(3, [
        "Use math ops",
        "50 * 2 - 10",
        "print(50 * 2 - 10)",
        "Solution: print(50 * 2 - 10)",
    ]),
    hints(4, [
        "Combine strings",
        "part1 + part2",
        "full_key = part1 + part2",
        "Solution:\npart1 = \"ACCESS\"\npart2 = \"_GRANTED\"\nfull_key = part1 + part2\nprint(full_key)",
    ]),
    hints(5, [
        "Use if statement",
        "if status == \"admin\":",
        "Indent the print",
        "Solution:\nstatus = \"admin\"\nif status == \"admin\":\n    print(\"OPEN\")",
    ]),
    hints(6, [
        "Use for loop",
        "for i in range(5):",
        "Indent print",
        "Solution:\nfor i in range(5):\n    print(\"OVERLOAD\")",
    ]),
    hints(7, [
        "Use while loop",
        "while signal < 4:",
        "Increment signal inside",
        "Solution:\nsignal = 1\nwhile signal < 4:\n    print(\"Scanning\")\n    signal += 1",
    ]),
    hints(8, [
        "Modulo % operator",
        "if i % 2 == 0:",
        "Inside loop range(6)",
        "Solution:\nfor i in range(6):\n    if i % 2 == 0:\n        print(\"Secure\")",
    ]),
    hints(9, [
        "While t > 0",
        "Decrement t = t - 1",
        "Print Liftoff after loop",
        "Solution:\nt = 5\nwhile t > 0:\n    print(t)\n    t -= 1\nprint(\"Liftoff\")",
    ]),
    hints(10, [
        "Use [] for lists",
        "targets = [\"A\", \"B\"]",
        "Add all 3 items",
        "Solution:\ntargets = [\"Drone\", \"Turret\", \"Wall\"]\nprint(targets)",
    ]),
    hints(11, [
        "Use index [0]",
        "codes[0]",
        "print(codes[0])",
        "Solution:\ncodes = [55, 12, 99]\nprint(codes[0])",
    ]),
    hints(12, [
        "for item in list",
        "for f in files:",
        "print(f)",
        "Solution:\nfiles = [\"sys.exe\", \"virus.bat\", \"log.txt\"]\nfor f in files:\n    print(f)",
    ]),
    hints(13, [
        "Slice [start:end]",
        "msg[6:10]",
        "print result",
        "Solution:\nmsg = \"ERROR_CODE_7\"\nprint(msg[6:10])",
    ]),
    hints(14, [
        "Dict uses {}",
        "user = {\"name\": \"Cipher\", ...}",
        "user[\"name\"]",
        "Solution:\nuser = {\"name\": \"Cipher\", \"rank\": 1}\nprint(user[\"name\"])",
    ]),
    hints(15, [
        "def name():",
        "def heal():",
        "Call heal() at end",
        "Solution:\ndef heal():\n    print(\"Shields Restored\")\n\nheal()",
    ]),
    hints(16, [
        "Use return",
        "return \"Ready\"",
        "print(get_status())",
        "Solution:\ndef get_status():\n    return \"Ready\"\n\nprint(get_status())",
    ]),
    hints(17, [
        "def charge(volts):",
        "print(volts)",
        "charge(50)",
        "Solution:\ndef charge(volts):\n    print(volts)\n\ncharge(50)",
    ]),
    hints(18, [
        "Loop range(3)",
        "if i == 1:",
        "else:",
        "Solution:\nfor i in range(3):\n    if i == 1:\n        print(\"ONE\")\n    else:\n        print(\"NOT\")",
    ]),
    hints(19, [
        "Loop data",
        "if item == 20:",
        "break",
        "Solution:\ndata = [10, 20, 30]\nfor item in data:\n    if item == 20:\n        print(\"FOUND\")\n        break",
    ]),
    hints(20, [
        "Loop range(5)",
        "if i < 3",
        "else print FIRE",
        "Solution:\nfor i in range(5):\n    if i < 3:\n        print(\"CHARGE\")\n    else:\n        print(\"FIRE\")",
    ]),
    hints(21, [
        "Multiple assignment",
        "x, y = y, x",
        "print(x); print(y)",
        "Solution:\nx = 10\ny = 20\nx, y = y, x\nprint(x)\nprint(y)",
    ]),
    hints(22, [
        ".replace()",
        "msg.replace(\"WIN\", \"FAIL\")",
        "Print the result",
        "Solution:\nmsg = \"KRONOS_WIN\"\nprint(msg.replace(\"WIN\", \"FAIL\"))",
    ]),
    hints(23, [
        ".append()",
        "inventory.append(\"Ammo\")",
        "Print inventory",
        "Solution:\ninventory = [\"Gun\"]\ninventory.append(\"Ammo\")\nprint(inventory)",
    ]),
    hints(24, [
        "Nested for loops",
        "for i in... for j in...",
        "print(i, j)",
        "Solution:\nfor i in range(3):\n    for j in range(3):\n        print(i, j)",
    ]),
    hints(25, [
        "dict[key] = value",
        "config[\"power\"] = 100",
        "print(config)",
        "Solution:\nconfig = {\"power\": 50, \"level\": 1}\nconfig[\"power\"] = 100\nprint(config)",
    ]),
    hints(26, [
        "while condition",
        "while password != \"secret\"",
        "update password",
        "Solution:\npassword = \"wrong\"\nwhile password != \"secret\":\n    print(\"Access Denied\")\n    password = \"secret\"",
    ]),
    hints(27, [
        "def name(a, b)",
        "print(x+y)",
        "target(10, 20)",
        "Solution:\ndef target(x, y):\n    print(x + y)\n\ntarget(10, 20)",
    ]),
    hints(28, [
        "return Boolean",
        "if x > 10 return True",
        "else return False",
        "Solution:\ndef check(x):\n    return x > 10\n\nprint(check(15))",
    ]),
    hints(29, [
        "f\"string\"",
        "f\"Level {level}\"",
        "print f-string",
        "Solution:\nlevel = 5\nprint(f\"Status: Level {level}\")",
    ]),
    hints(30, [
        "Recursion",
        "Call purge(n-1)",
        "Check n <= 0",
        "Solution:\ndef purge(n):\n    if n <= 0:\n        return\n    print(n)\n    purge(n - 1)\n\npurge(3)",
    ]),
    hints(31, [
        "import module",
        "import random",
        "random.randint",
        "Solution:\nimport random\nn = random.randint(1, 100)\nprint(n)",
    ]),
    hints(32, [
        "try...except",
        "except:",
        "print('Caught')",
        "Solution:\ntry:\n    print(1/0)\nexcept:\n    print(\"Caught\")",
    ]),
    hints(33, [
        "class Name",
        "class Bot:",
        "b = Bot()",
        "Solution:\nclass Bot:\n    pass\n\nb = Bot()\nprint(b)",
    ]),
    hints(34, [
        "Method(self)",
        "def scan(self):",
        "b.scan()",
        "Solution:\nclass Bot:\n    def scan(self):\n        print(\"Scanning\")\n\nb = Bot()\nb.scan()",
    ]),
    hints(35, [
        "in operator",
        "if 5 in ids:",
        "print Found",
        "Solution:\nids = [1, 5, 9]\nif 5 in ids:\n    print(\"Found\")",
    ]),
    hints(36, [
        ".sort()",
        "nums.sort()",
        "print nums",
        "Solution:\nnums = [3, 1, 2]\nnums.sort()\nprint(nums)",
    ]),
    hints(37, [
        "open(file, mode)",
        "mode 'w'",
        "f.write()",
        "Solution:\nf = open(\"log.txt\", \"w\")\nf.write(\"Entry\")\nf.close()",
    ]),
    hints(38, [
        "mode 'r'",
        "f.read()",
        "print content",
        "Solution:\nf = open(\"plan.txt\", \"r\")\nd = f.read()\nprint(d)",
    ]),
    hints(39, [
        "lambda",
        "lambda x: x*2",
        "double(5)",
        "Solution:\ndouble = lambda x: x * 2\nprint(double(5))",
    ]),
    hints(40, [
        "Modulo 3",
        "i % 3 == 0",
        "Patch vs Scan",
        "Solution:\nfor i in range(10):\n    if i % 3 == 0:\n        print(\"Patch\")\n    else:\n        print(\"Scan\")",
    ]),
    hints(41, [
        "Print",
        "Print it",
        "Just print it",
        "Solution: print(\"Singularity Achieved\")",
    ]),
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_lookup() {
        let set = &HINTS[0];
        assert_eq!(set.tier(1).unwrap(), "Use print()");
        assert_eq!(set.tier(4).unwrap(), "Solution: print(\"SYSTEM ONLINE\")");
    }

    #[test]
    fn test_tier_out_of_range() {
        let set = &HINTS[0];
        assert!(matches!(
            set.tier(0),
            Err(SingularityError::InvalidHintTier { tier: 0 })
        ));
        assert!(matches!(
            set.tier(5),
            Err(SingularityError::InvalidHintTier { tier: 5 })
        ));
    }

    #[test]
    fn test_solution_strips_prefix() {
        assert_eq!(HINTS[0].solution(), "print(\"SYSTEM ONLINE\")");
        assert_eq!(HINTS[1].solution(), "energy = 100\nprint(energy)");
    }

    #[test]
    fn test_table_is_ordered() {
        for (index, set) in HINTS.iter().enumerate() {
            assert_eq!(set.level_id as usize, index + 1);
            assert!(set.tiers[3].starts_with(SOLUTION_PREFIX));
        }
    }
}
