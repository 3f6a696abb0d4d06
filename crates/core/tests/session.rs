//! End-to-end command parsing against the demonstration table.

mod common;

use common::{TABLE, name_of, names, parse_err, parse_ok};
use scpi_toolchain_core::{
    ErrorKind, OptionalNodes, ParsedKind, ParsedParam, ParserConfig, ParserSession, Span, Unit,
};

// ─── Keywords ────────────────────────────────────────────────────────────────

#[test]
fn common_commands() {
    assert_eq!(
        names("*RST;*CLS;*IDN?"),
        vec![Ok("reset"), Ok("clear-status"), Ok("identify")]
    );
    assert_eq!(names("*rst"), vec![Ok("reset")]);
    assert_eq!(names("*RSTX"), vec![Err(ErrorKind::InvalidCommand)]);
}

#[test]
fn short_long_and_optional_keywords() {
    for line in [
        "VOLT 5",
        "VOLTAGE 5",
        "SOURce1:VOLTage:LEVel:IMMediate:AMPLitude 5",
        "sour:volt:ampl 5",
        "VOLT:IMM 5",
    ] {
        assert_eq!(name_of(&parse_ok(line)), "source.voltage", "{line}");
    }
    assert_eq!(parse_err("VOLTA 5"), ErrorKind::InvalidCommand);
    assert_eq!(parse_err("VOL 5"), ErrorKind::InvalidCommand);
    assert_eq!(parse_err("VOLT:AMPL:LEV 5"), ErrorKind::InvalidCommand);
}

#[test]
fn numeric_suffixes() {
    assert_eq!(parse_ok("SOUR3:VOLT 5").suffixes.as_slice(), &[3]);
    assert_eq!(parse_ok("VOLT 5").suffixes.as_slice(), &[1]);
    assert_eq!(parse_ok("OUTP2 OFF").suffixes.as_slice(), &[2]);
    assert_eq!(parse_ok("DISP:TEXT 'x'").suffixes.as_slice(), &[1]);
    assert_eq!(parse_ok("DISP:WIND4:TEXT 'x'").suffixes.as_slice(), &[4]);
    assert_eq!(parse_err("SOUR0:VOLT 5"), ErrorKind::NumericSuffixInvalid);
    assert_eq!(parse_err("SOUR99999999999:VOLT 5"), ErrorKind::NumericSuffixInvalid);
}

#[test]
fn configured_suffix_bounds() {
    let mut config = ParserConfig::default();
    config.suffix_max = 2;
    config.suffix_default = 2;
    let mut session = ParserSession::with_config(&TABLE, config);
    let err = session.parse_one("SOUR3:VOLT 5", true).expect_err("out of range");
    assert_eq!(err.kind, ErrorKind::NumericSuffixInvalid);
    let ok = session.parse_one("VOLT 5", true).expect("default suffix");
    assert_eq!(ok.suffixes.as_slice(), &[2]);
}

// ─── Parameters ──────────────────────────────────────────────────────────────

#[test]
fn numeric_with_units() {
    let c = parse_ok("VOLT 500 mV");
    assert_eq!(c.params[0].units(), Ok(Unit::Volt));
    assert!((c.params[0].to_f64().expect("numeric") - 0.5).abs() < 1e-12);

    assert_eq!(parse_ok("FREQ 10 MHZ").params[0].to_u64(), Ok(10_000_000));
    assert_eq!(parse_ok("CURR 2").params[0].units(), Ok(Unit::Ampere));
    assert_eq!(parse_err("VOLT 5 A"), ErrorKind::ParamUnits);
    assert_eq!(parse_err("CURR 1E99"), ErrorKind::ParamOverflow);
    assert_eq!(parse_err("CURR abc"), ErrorKind::ParamType);
}

#[test]
fn character_data_with_alternate() {
    assert_eq!(parse_ok("VOLT MAX").params[0], ParsedParam::CharacterData { item: 1 });
    assert_eq!(parse_ok("VOLT minimum").params[0].to_char_data_item(), Ok(0));
    assert_eq!(parse_ok("VOLT 2.5").params[0].kind(), ParsedKind::Numeric);

    let c = parse_ok("TRIG:SOUR EXT2");
    assert_eq!(c.params[0].to_char_data_item(), Ok(2));
    assert_eq!(c.suffixes.as_slice(), &[2]);
    assert!(parse_ok("TRIG:SOUR BUS").suffixes.is_empty());
    assert_eq!(parse_err("TRIG:SOUR FOO"), ErrorKind::ParamType);
}

#[test]
fn booleans() {
    assert_eq!(parse_ok("OUTP ON").params[0], ParsedParam::Boolean(true));
    assert_eq!(parse_ok("OUTP 0").params[0], ParsedParam::Boolean(false));
    assert_eq!(parse_ok("OUTP").params[0], ParsedParam::Boolean(true));
    assert_eq!(parse_err("OUTP MAYBE"), ErrorKind::ParamType);
}

#[test]
fn strings_and_unquoted_text() {
    let c = parse_ok("SYST:COMM:LAN:HOST 'lab-01'");
    assert_eq!(c.params[0].to_str(), Ok(("lab-01", Some('\''))));
    assert_eq!(parse_err("SYST:COMM:LAN:HOST lab"), ErrorKind::ParamType);
    assert_eq!(parse_err("SYST:COMM:LAN:HOST 'lab"), ErrorKind::UnmatchedQuote);

    let c = parse_ok("DISP:TEXT \"say \"\"hi\"\"; ok\"");
    let ParsedParam::String(s) = c.params[0] else {
        panic!("expected string, got {:?}", c.params[0]);
    };
    assert_eq!(s.unescaped(), "say \"hi\"; ok");

    assert!(parse_ok("SYST:LAB").params[0].is_none());
    assert_eq!(
        parse_ok("SYST:LAB bench 3").params[0],
        ParsedParam::UnquotedString("bench 3")
    );
}

#[test]
fn blocks_and_expressions() {
    let c = parse_ok("MEM:DATA3 1,#15hello");
    assert_eq!(c.suffixes.as_slice(), &[3]);
    assert_eq!(c.params[0].to_u32(), Ok(1));
    assert_eq!(c.params[1].to_block(), Ok(&b"hello"[..]));
    assert_eq!(parse_err("MEM:DATA3 1,#16hello"), ErrorKind::ParamType);

    let c = parse_ok("CALC:MATH (A+(B*2))");
    assert_eq!(c.params[0], ParsedParam::Expression("(A+(B*2))"));
    assert_eq!(parse_err("CALC:MATH (A"), ErrorKind::UnmatchedBracket);
}

#[test]
fn optional_parameters() {
    let c = parse_ok("CONF:VOLT");
    assert_eq!(c.param_count, 0);
    assert!(c.present_params().is_empty());

    let c = parse_ok("CONF:VOLT 10");
    assert_eq!(c.params[0].to_i64(), Ok(10));
    assert!(c.params[1].is_none());

    let c = parse_ok("CONF:VOLT ,1 mV");
    assert_eq!(c.param_count, 2);
    assert!(c.params[0].is_none());
    assert!((c.params[1].to_f64().expect("numeric") - 0.001).abs() < 1e-12);

    assert_eq!(parse_err("CONF:VOLT 1,2,3"), ErrorKind::ParamCount);
    assert_eq!(parse_err("*ESE"), ErrorKind::ParamCount);
    assert_eq!(parse_err("*ESE 1,2"), ErrorKind::ParamCount);
}

#[test]
fn lists() {
    let c = parse_ok("ROUT:CLOS (@1,3:5,slot2(1:4),DMM)");
    let ParsedParam::ChannelList(list) = c.params[0] else {
        panic!("expected channel list, got {:?}", c.params[0]);
    };
    assert_eq!(list.len(), 4);
    assert_eq!(list.path_entry(3), Ok("DMM"));

    assert_eq!(parse_err("ROUT:CLOS (@41)"), ErrorKind::InvalidValue);
    assert_eq!(parse_err("ROUT:CLOS (@1!2)"), ErrorKind::InvalidDims);
    assert_eq!(parse_err("ROUT:MATR:CLOS (@1)"), ErrorKind::InvalidDims);
    assert!(parse_ok("ROUT:MATR:CLOS (@1!2,3:5)").params[0].to_str().is_ok());

    let c = parse_ok("LIST:VOLT (1,-2.5,3:5)");
    let ParsedParam::NumericList(list) = c.params[0] else {
        panic!("expected numeric list, got {:?}", c.params[0]);
    };
    assert_eq!(list.len(), 3);
    let last = list.entry(2).expect("range entry");
    assert_eq!(last.last.map(|v| v.to_i64()), Some(Ok(5)));
}

// ─── Command tree ────────────────────────────────────────────────────────────

#[test]
fn tree_carries_between_commands() {
    assert_eq!(
        names("SOUR2:VOLT 5;CURR 1;FREQ 1KHZ"),
        vec![Ok("source.voltage"), Ok("source.current"), Ok("source.frequency")]
    );
    assert_eq!(
        names("SOUR2:VOLT 5;OUTP ON"),
        vec![Ok("source.voltage"), Err(ErrorKind::InvalidCommand)]
    );
    assert_eq!(
        names("SOUR2:VOLT 5;:OUTP ON;*RST"),
        vec![Ok("source.voltage"), Ok("output.state"), Ok("reset")]
    );
    assert_eq!(names("SYST:ERR?;ERR?"), vec![Ok("system.error"), Ok("system.error")]);
}

#[test]
fn suffixes_follow_the_tree() {
    let mut session = ParserSession::new(&TABLE);
    let results: Vec<_> = session.commands("SOUR2:VOLT 5;CURR 1").collect();
    assert_eq!(
        results[1].as_ref().map(|c| c.suffixes.as_slice().to_vec()),
        Ok(vec![2])
    );
    assert_eq!(session.scope(), "SOURce2:");
    assert_eq!(session.previous_suffixes().as_slice(), &[2]);
}

#[test]
fn optional_node_modes() {
    let line = "SOUR2:VOLT:LEV 5;IMM 3";
    assert_eq!(names(line), vec![Ok("source.voltage"), Ok("source.voltage")]);

    let mut config = ParserConfig::default();
    config.optional_nodes = OptionalNodes::Legacy;
    let mut session = ParserSession::with_config(&TABLE, config);
    let kinds: Vec<_> = session.commands(line).map(|r| r.map(|c| c.index).map_err(|e| e.kind)).collect();
    assert_eq!(kinds[1], Err(ErrorKind::InvalidCommand));
    assert_eq!(session.parse_one("AMPL 3", false).map(|c| c.index), Ok(kinds[0].expect("first")));
}

#[test]
fn scope_can_be_set_explicitly() {
    let mut session = ParserSession::new(&TABLE);
    session.set_scope("TRIGger:");
    assert!(session.parse_one("SOUR BUS", false).is_ok());
    session.reset_tree();
    assert!(session.parse_one("SOUR BUS", false).is_err());
}

// ─── Cursor handling ─────────────────────────────────────────────────────────

#[test]
fn cursor_advances_past_each_command() {
    let mut session = ParserSession::new(&TABLE);
    let mut cursor = "*RST ; VOLT 5 ;; ";
    assert!(session.parse_next(&mut cursor, true).is_ok());
    assert_eq!(cursor, "; VOLT 5 ;; ");
    assert!(session.parse_next(&mut cursor, false).is_ok());
    assert_eq!(cursor, ";; ");
    let err = session.parse_next(&mut cursor, false).expect_err("nothing left");
    assert_eq!(err.kind, ErrorKind::NoCommand);
    assert_eq!(cursor, "");
}

#[test]
fn spans_and_diagnostics() {
    let mut session = ParserSession::new(&TABLE);
    let line = "VOLT 1; BOGUS 2";
    let results: Vec<_> = session.commands(line).collect();
    let ok = results[0].as_ref().expect("first");
    assert_eq!(ok.span, Span::new(0, 6));
    let err = results[1].as_ref().expect_err("second");
    assert_eq!(err.span, Span::new(8, 15));
    assert_eq!(&line[err.span.start..err.span.end], "BOGUS 2");
    let diag = err.to_diagnostic();
    assert_eq!(diag.id, ErrorKind::InvalidCommand.id());
    assert_eq!(diag.span, Some(err.span));
}

#[test]
fn blank_lines_yield_nothing() {
    let mut session = ParserSession::new(&TABLE);
    assert_eq!(session.commands("").count(), 0);
    assert_eq!(session.commands(" ;; ").count(), 0);
}
