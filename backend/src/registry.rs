//! Generator registry
//!
//! Maps the public generator names to constructors. Lookup ignores ASCII
//! case and treats `-` and `_` alike, so `MSVCRT_MUL` finds `msvcrt-mul`.

use crate::prng::{
    DotNetRandom, GlibcRandom, LcgGenerator, MssqlRand, MysqlRand, Prng, PureBasicRandom,
    V8Random,
};

/// A named generator constructor
#[derive(Debug, Clone, Copy)]
pub struct GeneratorEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub create: fn() -> Box<dyn Prng>,
}

static ENTRIES: &[GeneratorEntry] = &[
    GeneratorEntry {
        name: "msvcrt",
        description: "Microsoft C runtime rand(), modulo bounding",
        create: || Box::new(LcgGenerator::msvcrt()),
    },
    GeneratorEntry {
        name: "msvcrt-mul",
        description: "Microsoft C runtime rand(), scaled by rand() * n / (RAND_MAX + 1)",
        create: || Box::new(LcgGenerator::msvcrt_mul()),
    },
    GeneratorEntry {
        name: "bsd-libc",
        description: "BSD libc rand(), Park-Miller minimal standard",
        create: || Box::new(LcgGenerator::bsd_libc()),
    },
    GeneratorEntry {
        name: "bsd-libc-old",
        description: "historic BSD libc rand(), 31-bit ANSI C LCG",
        create: || Box::new(LcgGenerator::bsd_libc_old()),
    },
    GeneratorEntry {
        name: "vbscript",
        description: "VBScript / VBA Rnd(), 24-bit LCG in single precision",
        create: || Box::new(LcgGenerator::vbscript()),
    },
    GeneratorEntry {
        name: "java",
        description: "java.util.Random nextInt(bound)",
        create: || Box::new(LcgGenerator::java()),
    },
    GeneratorEntry {
        name: "glibc-type3",
        description: "glibc random() with the default TYPE_3 state",
        create: || Box::new(GlibcRandom::new()),
    },
    GeneratorEntry {
        name: "dotnet",
        description: ".NET System.Random Next(max), scaled sample",
        create: || Box::new(DotNetRandom::scaled()),
    },
    GeneratorEntry {
        name: "dotnet-mod",
        description: ".NET System.Random Next() reduced modulo the limit",
        create: || Box::new(DotNetRandom::modulo()),
    },
    GeneratorEntry {
        name: "mssql",
        description: "SQL Server RAND(), L'Ecuyer combined Lehmer generators",
        create: || Box::new(MssqlRand::new()),
    },
    GeneratorEntry {
        name: "mysql",
        description: "MySQL RAND(N), forward only",
        create: || Box::new(MysqlRand::new()),
    },
    GeneratorEntry {
        name: "v8",
        description: "V8 Math.random() before 4.9, dual multiply-with-carry",
        create: || Box::new(V8Random::new()),
    },
    GeneratorEntry {
        name: "purebasic",
        description: "PureBasic Random(), RANROT type B",
        create: || Box::new(PureBasicRandom::new()),
    },
];

pub fn entries() -> &'static [GeneratorEntry] {
    ENTRIES
}

pub fn names() -> impl Iterator<Item = &'static str> {
    ENTRIES.iter().map(|entry| entry.name)
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
        .collect()
}

pub fn find(name: &str) -> Option<&'static GeneratorEntry> {
    let wanted = normalize(name);
    ENTRIES.iter().find(|entry| entry.name == wanted)
}

/// Construct a generator by name
///
/// # Example
/// ```
/// use seedsleuth_core::registry;
///
/// let mut rng = registry::create("MSVCRT").unwrap();
/// rng.seed(1).unwrap();
/// assert_eq!(rng.next(), 41);
/// assert!(registry::create("mt19937").is_none());
/// ```
pub fn create(name: &str) -> Option<Box<dyn Prng>> {
    find(name).map(|entry| (entry.create)())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_names_match_generators() {
        for entry in entries() {
            let rng = (entry.create)();
            assert_eq!(rng.name(), entry.name);
        }
    }

    #[test]
    fn test_lookup_is_separator_agnostic() {
        assert_eq!(find("GLIBC_TYPE3").map(|e| e.name), Some("glibc-type3"));
        assert_eq!(find(" dotnet-mod ").map(|e| e.name), Some("dotnet-mod"));
        assert!(find("glibc").is_none());
    }
}
