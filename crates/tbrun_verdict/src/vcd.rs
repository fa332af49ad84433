//! Reader for IEEE 1364 Value Change Dump files.
//!
//! The format is whitespace-delimited, so the reader works on a token stream
//! rather than on lines: `$var wire 1 ! clk $end` is the same declaration
//! whether it spans one line or four.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tbrun_common::{parse_duration, Logic, LogicVec, SimTime};

/// Errors that can occur while loading a VCD file.
#[derive(Debug, thiserror::Error)]
pub enum VcdLoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// A malformed declaration or value change.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },
    /// A `$keyword` section was never closed by `$end`.
    #[error("unterminated ${0} section")]
    Unterminated(String),
    /// Variables were declared but the header never ended.
    #[error("missing $enddefinitions")]
    MissingEndDefinitions,
}

/// A variable declared in the VCD header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VcdSignal {
    /// Identifier code used in value changes.
    pub id_code: String,
    /// Dotted hierarchical path, e.g. `tb.dut.pass_o`.
    pub path: String,
    /// Bit width.
    pub width: u32,
    /// Declared variable type, e.g. `wire` or `reg`.
    pub var_type: String,
}

/// A fully loaded waveform.
#[derive(Clone, Debug, Default)]
pub struct LoadedWaveform {
    /// Femtoseconds per VCD time unit.
    pub fs_per_unit: u64,
    /// Declared signals in declaration order.
    pub signals: Vec<VcdSignal>,
    /// Value histories parallel to `signals`, sorted by time. Empty for
    /// signals that were not selected when loading.
    pub histories: Vec<Vec<(SimTime, LogicVec)>>,
    /// The last timestamp in the dump.
    pub end: SimTime,
}

impl LoadedWaveform {
    /// Finds a signal by its exact hierarchical path.
    pub fn find(&self, path: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.path == path)
    }

    /// Finds a signal by exact path, else by the shallowest `.<name>` suffix.
    ///
    /// Among equally shallow matches the first declared one wins.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.find(name) {
            return Some(idx);
        }
        let suffix = format!(".{name}");
        self.signals
            .iter()
            .enumerate()
            .filter(|(_, s)| s.path.ends_with(&suffix))
            .min_by_key(|(idx, s)| (s.path.matches('.').count(), *idx))
            .map(|(idx, _)| idx)
    }
}

/// Reads and parses a VCD file.
pub fn load_vcd_file(path: &Path) -> Result<LoadedWaveform, VcdLoadError> {
    parse_vcd(&read(path)?)
}

/// Reads a VCD file, keeping histories only for the signals named in `names`.
pub fn load_vcd_file_for(path: &Path, names: &[&str]) -> Result<LoadedWaveform, VcdLoadError> {
    parse_vcd_for(&read(path)?, names)
}

fn read(path: &Path) -> Result<String, VcdLoadError> {
    std::fs::read_to_string(path).map_err(|source| VcdLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses VCD text.
pub fn parse_vcd(text: &str) -> Result<LoadedWaveform, VcdLoadError> {
    parse(text, None)
}

/// Parses VCD text, recording value changes only for the signals that
/// [`LoadedWaveform::find_by_name`] resolves `names` to.
///
/// Every declaration is still loaded; other signals keep empty histories.
/// Names that match nothing are ignored here and left for the caller's lookup.
pub fn parse_vcd_for(text: &str, names: &[&str]) -> Result<LoadedWaveform, VcdLoadError> {
    parse(text, Some(names))
}

fn parse(text: &str, names: Option<&[&str]>) -> Result<LoadedWaveform, VcdLoadError> {
    let tokens = text
        .lines()
        .enumerate()
        .flat_map(|(n, line)| line.split_whitespace().map(move |tok| (n + 1, tok)));
    let mut parser = Parser {
        tokens: Box::new(tokens),
        waveform: LoadedWaveform {
            fs_per_unit: 1,
            ..LoadedWaveform::default()
        },
        scopes: Vec::new(),
        ids: HashMap::new(),
        now: SimTime::ZERO,
    };
    parser.header()?;
    let selected: Vec<usize> = match names {
        None => (0..parser.waveform.signals.len()).collect(),
        Some(names) => names
            .iter()
            .filter_map(|name| parser.waveform.find_by_name(name))
            .collect(),
    };
    parser.index(&selected);
    parser.body()?;
    Ok(parser.waveform)
}

struct Parser<'a> {
    tokens: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    waveform: LoadedWaveform,
    scopes: Vec<String>,
    /// Identifier code to the recorded signals declared with it.
    ids: HashMap<String, Vec<usize>>,
    now: SimTime,
}

impl<'a> Parser<'a> {
    /// Collects the tokens of a `$keyword ... $end` section.
    fn section(&mut self, keyword: &str) -> Result<(usize, Vec<&'a str>), VcdLoadError> {
        let mut body = Vec::new();
        let mut first_line = 0;
        for (line, tok) in self.tokens.by_ref() {
            if first_line == 0 {
                first_line = line;
            }
            if tok == "$end" {
                return Ok((first_line, body));
            }
            body.push(tok);
        }
        Err(VcdLoadError::Unterminated(keyword.to_string()))
    }

    fn header(&mut self) -> Result<(), VcdLoadError> {
        while let Some((line, tok)) = self.tokens.next() {
            match tok {
                "$timescale" => {
                    let (_, body) = self.section("timescale")?;
                    let text = body.concat();
                    let unit = parse_duration(&text).map_err(|e| VcdLoadError::Parse {
                        line,
                        message: format!("invalid timescale '{text}': {e}"),
                    })?;
                    self.waveform.fs_per_unit = unit.fs.max(1);
                }
                "$scope" => {
                    let (_, body) = self.section("scope")?;
                    let name = body.last().copied().unwrap_or("");
                    self.scopes.push(name.to_string());
                }
                "$upscope" => {
                    self.section("upscope")?;
                    self.scopes.pop();
                }
                "$var" => {
                    let (_, body) = self.section("var")?;
                    self.declare(line, &body)?;
                }
                "$enddefinitions" => {
                    self.section("enddefinitions")?;
                    return Ok(());
                }
                kw if kw.starts_with('$') => {
                    self.section(&kw[1..])?;
                }
                other => {
                    return Err(VcdLoadError::Parse {
                        line,
                        message: format!("unexpected token '{other}' in header"),
                    });
                }
            }
        }
        if self.waveform.signals.is_empty() {
            Ok(())
        } else {
            Err(VcdLoadError::MissingEndDefinitions)
        }
    }

    fn declare(&mut self, line: usize, body: &[&str]) -> Result<(), VcdLoadError> {
        let [var_type, width, id_code, name, ..] = body else {
            return Err(VcdLoadError::Parse {
                line,
                message: format!("invalid $var: {}", body.join(" ")),
            });
        };
        let width: u32 = width.parse().map_err(|_| VcdLoadError::Parse {
            line,
            message: format!("invalid width in $var: {width}"),
        })?;
        let path = if self.scopes.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.scopes.join("."), name)
        };
        self.waveform.signals.push(VcdSignal {
            id_code: id_code.to_string(),
            path,
            width,
            var_type: var_type.to_string(),
        });
        self.waveform.histories.push(Vec::new());
        Ok(())
    }

    fn index(&mut self, selected: &[usize]) {
        for &idx in selected {
            let id = self.waveform.signals[idx].id_code.clone();
            let slots = self.ids.entry(id).or_default();
            if !slots.contains(&idx) {
                slots.push(idx);
            }
        }
    }

    fn body(&mut self) -> Result<(), VcdLoadError> {
        while let Some((line, tok)) = self.tokens.next() {
            if let Some(stamp) = tok.strip_prefix('#') {
                let units: u64 = stamp.parse().map_err(|_| VcdLoadError::Parse {
                    line,
                    message: format!("invalid timestamp: {tok}"),
                })?;
                let fs = units
                    .checked_mul(self.waveform.fs_per_unit)
                    .ok_or_else(|| VcdLoadError::Parse {
                        line,
                        message: format!("timestamp out of range: {tok}"),
                    })?;
                self.now = SimTime::from_fs(fs);
                self.waveform.end = self.waveform.end.max(self.now);
                continue;
            }
            match tok {
                "$dumpvars" | "$dumpall" | "$dumpon" | "$dumpoff" | "$end" => {}
                "$comment" => {
                    self.section("comment")?;
                }
                _ => self.value_change(line, tok)?,
            }
        }
        Ok(())
    }

    fn value_change(&mut self, line: usize, tok: &'a str) -> Result<(), VcdLoadError> {
        let mut chars = tok.chars();
        match chars.next() {
            Some('b' | 'B') => {
                let id = self.next_id(line, tok)?;
                let bits = LogicVec::from_binary_str(&tok[1..]).ok_or_else(|| VcdLoadError::Parse {
                    line,
                    message: format!("invalid binary value: {tok}"),
                })?;
                self.record(id, bits);
            }
            Some('r' | 'R') => {
                self.next_id(line, tok)?;
            }
            Some(c) => {
                let value = Logic::from_char(c).ok_or_else(|| VcdLoadError::Parse {
                    line,
                    message: format!("unexpected value change: {tok}"),
                })?;
                let id = chars.as_str();
                if id.is_empty() {
                    return Err(VcdLoadError::Parse {
                        line,
                        message: format!("value change without identifier: {tok}"),
                    });
                }
                self.record(id, LogicVec::from_logic(value));
            }
            None => {}
        }
        Ok(())
    }

    fn next_id(&mut self, line: usize, value: &str) -> Result<&'a str, VcdLoadError> {
        self.tokens
            .next()
            .map(|(_, id)| id)
            .ok_or_else(|| VcdLoadError::Parse {
                line,
                message: format!("value change without identifier: {value}"),
            })
    }

    /// Appends a change to every recorded signal declared with `id`.
    fn record(&mut self, id: &str, bits: LogicVec) {
        let Some(slots) = self.ids.get(id) else {
            return;
        };
        for &idx in slots {
            let value = extend(&bits, self.waveform.signals[idx].width);
            self.waveform.histories[idx].push((self.now, value));
        }
    }
}

/// Left-extends `bits` to `width`: with `X`/`Z` if that is the leading bit, else `0`.
fn extend(bits: &LogicVec, width: u32) -> LogicVec {
    let given = bits.width();
    let fill = match given.checked_sub(1).map(|msb| bits.get(msb)) {
        Some(l @ (Logic::X | Logic::Z)) => l,
        _ => Logic::Zero,
    };
    let mut out = LogicVec::filled(width, fill);
    for i in 0..given.min(width) {
        out.set(i, bits.get(i));
    }
    out
}
