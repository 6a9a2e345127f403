//! LIR (Layout IR) parser implementation.
//!
//! The format is line oriented: every line is a directive, a function or block
//! header, an instruction, or a closing brace. Names are resolved after the
//! enclosing scope is complete, so blocks and functions may be referenced
//! before they are defined.

use super::*;
use crate::core::error::{MetricsError, MetricsResult};
use std::collections::HashMap;

pub fn parse_ir(text: &str) -> MetricsResult<LayoutIR> {
    let parser = Parser::new(text);
    parser.parse()
}

struct Parser<'a> {
    text: &'a str,
    ir: LayoutIR,

    // Global maps
    funcs: HashMap<&'a str, u32>,
    call_resolves: Vec<Resolve<'a>>,

    // Per-function state
    cur_func: Option<OpenFunction<'a>>,
    blocks: HashMap<&'a str, u32>,
    succ_resolves: Vec<Resolve<'a>>,
}

#[derive(Debug)]
struct Resolve<'a> {
    name: &'a str,
    index: u32,
    line: usize,
}

#[derive(Debug)]
struct OpenFunction<'a> {
    name: &'a str,
    idx: u32,
    line: usize,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '.' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '.' | '$'))
}

fn parse_number(line: usize, s: &str) -> MetricsResult<u64> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| MetricsError::parse(line, format!("invalid number '{}': {}", s, e)))
}

fn parse_range(line: usize, s: &str) -> MetricsResult<(u64, u64)> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| MetricsError::parse(line, format!("expected range 'start..end' but found '{}'", s)))?;
    let start = parse_number(line, start)?;
    let end = parse_number(line, end)?;
    if end < start {
        return Err(MetricsError::parse(
            line,
            format!("range end 0x{:x} is below start 0x{:x}", end, start),
        ));
    }
    Ok((start, end))
}

fn split_attr(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (token, None),
    }
}

fn require_value<'t>(line: usize, key: &str, value: Option<&'t str>) -> MetricsResult<&'t str> {
    value.ok_or_else(|| MetricsError::parse(line, format!("attribute '{}' needs a value", key)))
}

fn tokenize(line: &str) -> Vec<&str> {
    let code = match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    };
    code.split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|token| !token.is_empty())
        .collect()
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            ir: LayoutIR::new(),
            funcs: HashMap::new(),
            call_resolves: Vec::new(),
            cur_func: None,
            blocks: HashMap::new(),
            succ_resolves: Vec::new(),
        }
    }

    fn parse(mut self) -> MetricsResult<LayoutIR> {
        let text = self.text;
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let tokens = tokenize(line);
            if tokens.is_empty() {
                continue;
            }
            if let Err(e) = self.parse_line(line_no, &tokens) {
                log::debug!("LIR parse error: {}", e);
                return Err(e);
            }
        }

        if let Some(open) = &self.cur_func {
            return Err(MetricsError::parse(
                open.line,
                format!("function '{}' is never closed", open.name),
            ));
        }

        self.resolve_calls();
        log::debug!(
            "Parsed LIR: {} functions, {} blocks, {} instructions",
            self.ir.functions.len(),
            self.ir.blocks.len(),
            self.ir.insts.len()
        );
        Ok(self.ir)
    }

    fn parse_line(&mut self, line: usize, tokens: &[&'a str]) -> MetricsResult<()> {
        if self.cur_func.is_none() {
            return match tokens[0] {
                "relocs" if tokens.len() == 1 => {
                    self.ir.uses_relocations = true;
                    Ok(())
                }
                "declare" => self.parse_function(line, &tokens[1..], false),
                "func" => self.parse_function(line, &tokens[1..], true),
                other => Err(MetricsError::parse(
                    line,
                    format!("expected 'func', 'declare' or 'relocs' but found '{}'", other),
                )),
            };
        }

        if tokens.len() == 1 && tokens[0] == "}" {
            return self.close_function(line);
        }
        if let Some(name) = tokens[0].strip_suffix(':') {
            return self.parse_block(line, name, &tokens[1..]);
        }
        self.parse_instruction(line, tokens)
    }

    fn parse_function(&mut self, line: usize, tokens: &[&'a str], has_body: bool) -> MetricsResult<()> {
        let Some((&name, mut attrs)) = tokens.split_first() else {
            return Err(MetricsError::parse(line, "expected function name"));
        };
        if !is_identifier(name) {
            return Err(MetricsError::parse(line, format!("invalid function name '{}'", name)));
        }
        if self.funcs.contains_key(name) {
            return Err(MetricsError::Duplicate {
                line,
                kind: "function",
                name: name.to_string(),
            });
        }

        if has_body {
            match attrs.split_last() {
                Some((&"{", rest)) => attrs = rest,
                _ => return Err(MetricsError::parse(line, format!("expected '{{' after function '{}'", name))),
            }
        }

        let block_idx = self.ir.blocks.len() as u32;
        let mut func = Function {
            name: name.to_string(),
            address: 0,
            simple: false,
            has_profile: false,
            index: None,
            exec_count: None,
            block_begin_idx: block_idx,
            block_end_idx: block_idx,
        };

        for &attr in attrs {
            match split_attr(attr) {
                ("addr", value) => func.address = parse_number(line, require_value(line, "addr", value)?)?,
                ("count", value) => func.exec_count = Some(parse_number(line, require_value(line, "count", value)?)?),
                ("index", value) => {
                    let index = parse_number(line, require_value(line, "index", value)?)?;
                    let index = u32::try_from(index)
                        .map_err(|_| MetricsError::parse(line, format!("index {} out of range", index)))?;
                    func.index = Some(index);
                }
                ("profile", None) => func.has_profile = true,
                ("simple", None) => func.simple = true,
                _ => return Err(MetricsError::parse(line, format!("unknown function attribute '{}'", attr))),
            }
        }

        let func_idx = self.ir.functions.len() as u32;
        self.funcs.insert(name, func_idx);
        self.ir.functions.push(func);

        if has_body {
            self.blocks.clear();
            self.succ_resolves.clear();
            self.cur_func = Some(OpenFunction { name, idx: func_idx, line });
        }
        Ok(())
    }

    fn parse_block(&mut self, line: usize, name: &'a str, attrs: &[&'a str]) -> MetricsResult<()> {
        if !is_identifier(name) {
            return Err(MetricsError::parse(line, format!("invalid block name '{}'", name)));
        }
        if self.blocks.contains_key(name) {
            return Err(MetricsError::Duplicate {
                line,
                kind: "block",
                name: name.to_string(),
            });
        }

        let func_address = match &self.cur_func {
            Some(open) => self.ir.functions[open.idx as usize].address,
            None => 0,
        };

        let mut output = None;
        let mut input_offset = None;
        let mut original_size = None;
        let mut exec_count = None;
        let mut cold = false;
        for &attr in attrs {
            match split_attr(attr) {
                ("out", value) => output = Some(parse_range(line, require_value(line, "out", value)?)?),
                ("in", value) => input_offset = Some(parse_number(line, require_value(line, "in", value)?)?),
                ("size", value) => original_size = Some(parse_number(line, require_value(line, "size", value)?)?),
                ("count", value) => exec_count = Some(parse_number(line, require_value(line, "count", value)?)?),
                ("cold", None) => cold = true,
                _ => return Err(MetricsError::parse(line, format!("unknown block attribute '{}'", attr))),
            }
        }
        let Some((output_start, output_end)) = output else {
            return Err(MetricsError::parse(line, format!("block '{}' has no 'out=' range", name)));
        };

        let block_idx = self.ir.blocks.len() as u32;
        self.blocks.insert(name, block_idx);
        let succ_idx = self.ir.succs.len() as u32;
        let inst_idx = self.ir.insts.len() as u32;
        self.ir.blocks.push(Block {
            name: name.to_string(),
            output_start,
            output_end,
            input_offset: input_offset.unwrap_or_else(|| output_start.saturating_sub(func_address)),
            original_size: original_size.unwrap_or(output_end - output_start),
            exec_count,
            cold,
            succ_begin_idx: succ_idx,
            succ_end_idx: succ_idx,
            inst_begin_idx: inst_idx,
            inst_end_idx: inst_idx,
        });
        Ok(())
    }

    fn parse_instruction(&mut self, line: usize, tokens: &[&'a str]) -> MetricsResult<()> {
        let block_begin = match &self.cur_func {
            Some(open) => self.ir.functions[open.idx as usize].block_begin_idx,
            None => 0,
        };
        if self.ir.blocks.len() as u32 == block_begin {
            return Err(MetricsError::parse(line, "instruction outside of a block"));
        }

        let mnemonic = tokens[0];
        let is_call = mnemonic == "call";
        let mut target = None;

        for &operand in &tokens[1..] {
            if let Some(sym) = operand.strip_prefix('@') {
                if !is_call {
                    return Err(MetricsError::parse(
                        line,
                        format!("symbol operand '{}' on non-call instruction '{}'", operand, mnemonic),
                    ));
                }
                if target.replace(sym).is_some() {
                    return Err(MetricsError::parse(line, "call has more than one target"));
                }
            } else if let Some(succ) = operand.strip_prefix('^') {
                self.parse_successor(line, succ)?;
            }
            // Any other operand is opaque.
        }

        let inst_idx = self.ir.insts.len() as u32;
        if let Some(name) = target {
            self.call_resolves.push(Resolve { name, index: inst_idx, line });
        }
        self.ir.insts.push(Inst {
            mnemonic: mnemonic.to_string(),
            kind: if is_call { InstKind::Call { target: None } } else { InstKind::Other },
        });

        let succ_end = self.ir.succs.len() as u32;
        let inst_end = self.ir.insts.len() as u32;
        if let Some(block) = self.ir.blocks.last_mut() {
            block.succ_end_idx = succ_end;
            block.inst_end_idx = inst_end;
        }
        Ok(())
    }

    fn parse_successor(&mut self, line: usize, operand: &'a str) -> MetricsResult<()> {
        let (name, count) = match operand.split_once(':') {
            Some((name, "?")) => (name, None),
            Some((name, count)) => (name, Some(parse_number(line, count)?)),
            None => (operand, None),
        };
        if !is_identifier(name) {
            return Err(MetricsError::parse(line, format!("invalid successor '^{}'", operand)));
        }
        self.succ_resolves.push(Resolve {
            name,
            index: self.ir.succs.len() as u32,
            line,
        });
        self.ir.succs.push(Successor { block: 0, count });
        Ok(())
    }

    fn close_function(&mut self, _line: usize) -> MetricsResult<()> {
        let Some(open) = self.cur_func.take() else {
            return Ok(());
        };

        for resolve in &self.succ_resolves {
            let Some(&block) = self.blocks.get(resolve.name) else {
                return Err(MetricsError::UnknownBlock {
                    line: resolve.line,
                    func: open.name.to_string(),
                    name: resolve.name.to_string(),
                });
            };
            self.ir.succs[resolve.index as usize].block = block;
        }

        self.ir.functions[open.idx as usize].block_end_idx = self.ir.blocks.len() as u32;
        self.blocks.clear();
        self.succ_resolves.clear();
        Ok(())
    }

    fn resolve_calls(&mut self) {
        for resolve in &self.call_resolves {
            let target = self.funcs.get(resolve.name).copied();
            if target.is_none() {
                log::trace!("line {}: call target '@{}' is unresolved", resolve.line, resolve.name);
            }
            self.ir.insts[resolve.index as usize].kind = InstKind::Call { target };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_function() {
        let ir = parse_ir(
            r#"
; a single function
func main addr=0x1000 count=7 profile simple index=2 {
entry: out=0x1000..0x1010 count=7
  mov %rdi, %rax
  jcc ^exit:5, ^side:?
side: out=0x1010..0x1018 cold
  jmp ^exit
exit: out=0x1018..0x1020
  ret
}
"#,
        )
        .unwrap();

        assert_eq!(ir.functions.len(), 1);
        let main = &ir.functions[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.address, 0x1000);
        assert_eq!(main.exec_count, Some(7));
        assert_eq!(main.index, Some(2));
        assert!(main.simple && main.has_profile);
        assert_eq!(ir.func_blocks(main).len(), 3);

        let entry = &ir.blocks[0];
        assert_eq!(entry.input_offset, 0);
        assert_eq!(entry.original_size, 16);
        let succs = ir.block_succs(entry);
        assert_eq!(succs, &[Successor { block: 2, count: Some(5) }, Successor { block: 1, count: None }]);
        assert_eq!(ir.block_insts(entry).len(), 2);

        assert!(ir.blocks[1].cold);
        assert_eq!(ir.block_succs(&ir.blocks[1]), &[Successor { block: 2, count: None }]);
    }

    #[test]
    fn test_forward_call_and_unresolved_symbol() {
        let ir = parse_ir(
            r#"
func a {
entry: out=0x0..0x8
  call @b
  call @missing
  call *%rax
}
declare b
"#,
        )
        .unwrap();

        assert_eq!(ir.insts[0].kind, InstKind::Call { target: Some(1) });
        assert_eq!(ir.insts[1].kind, InstKind::Call { target: None });
        assert_eq!(ir.insts[2].kind, InstKind::Call { target: None });
        assert!(ir.func_blocks(&ir.functions[1]).is_empty());
    }

    #[test]
    fn test_relocs_directive() {
        let ir = parse_ir("relocs\n").unwrap();
        assert!(ir.uses_relocations);
        assert!(ir.functions.is_empty());
    }

    #[test]
    fn test_unknown_block_is_error() {
        let err = parse_ir("func f {\nentry: out=0x0..0x4\n  jmp ^nowhere:1\n}\n").unwrap_err();
        assert!(matches!(err, MetricsError::UnknownBlock { line: 3, .. }), "{err}");
    }

    #[test]
    fn test_duplicate_names() {
        let err = parse_ir("declare f\ndeclare f\n").unwrap_err();
        assert!(matches!(err, MetricsError::Duplicate { kind: "function", line: 2, .. }));

        let err = parse_ir("func f {\na: out=0..4\na: out=4..8\n}\n").unwrap_err();
        assert!(matches!(err, MetricsError::Duplicate { kind: "block", line: 3, .. }));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(parse_ir("func f {\n  ret\n}\n").is_err());
        assert!(parse_ir("func f {\na: count=1\n}\n").is_err());
        assert!(parse_ir("func f {\na: out=0x10..0x8\n}\n").is_err());
        assert!(parse_ir("func f {\na: out=0..4\n").is_err());
        assert!(parse_ir("func f bogus {\n}\n").is_err());
        assert!(parse_ir("func f {\na: out=0..4 count=zz\n}\n").is_err());
        assert!(parse_ir("func f {\na: out=0..4\n  jmp @f\n}\n").is_err());
        assert!(parse_ir("block\n").is_err());
    }
}
