//! Names and classes the runtime provides without a declaration.

use once_cell::sync::Lazy;

use crate::analysis::Analysis;
use crate::parser::{ParseOptions, Parser};
use crate::util::fast_map::{FastHashSet, fast_hash_set_new};

const BUILTIN_VARIABLE_NAMES: &[&str] = &[
    "a_ahkpath", "a_ahkversion", "a_appdata", "a_appdatacommon", "a_args", "a_clipboard", "a_computername",
    "a_comspec", "a_controldelay", "a_cursor", "a_dd", "a_ddd", "a_dddd", "a_defaultmousespeed", "a_desktop",
    "a_desktopcommon", "a_detecthiddentext", "a_detecthiddenwindows", "a_endchar", "a_eventinfo", "a_fileencoding",
    "a_hour", "a_iconfile", "a_iconhidden", "a_iconnumber", "a_icontip", "a_index", "a_initialworkingdir",
    "a_is64bitos", "a_isadmin", "a_iscompiled", "a_iscritical", "a_ispaused", "a_issuspended", "a_keydelay",
    "a_language", "a_lasterror", "a_linefile", "a_linenumber", "a_loopfield", "a_loopfilename", "a_loopfilepath",
    "a_loopreadline", "a_loopregkey", "a_loopregname", "a_loopregtype", "a_maxhotkeysperinterval", "a_mday",
    "a_min", "a_mm", "a_mmm", "a_mmmm", "a_mon", "a_mousedelay", "a_msec", "a_mydocuments", "a_now", "a_nowutc",
    "a_osversion", "a_priorhotkey", "a_priorkey", "a_programfiles", "a_programs", "a_programscommon",
    "a_ptrsize", "a_regview", "a_screendpi", "a_screenheight", "a_screenwidth", "a_scriptdir", "a_scriptfullpath",
    "a_scripthwnd", "a_scriptname", "a_sec", "a_senddelay", "a_sendlevel", "a_sendmode", "a_space", "a_startmenu",
    "a_startmenucommon", "a_startup", "a_startupcommon", "a_storecapslockmode", "a_tab", "a_temp",
    "a_thisfunc", "a_thishotkey", "a_thismenu", "a_thismenuitem", "a_thismenuitempos", "a_tickcount",
    "a_timeidle", "a_timeidlekeyboard", "a_timeidlemouse", "a_timeidlephysical", "a_timesincepriorhotkey",
    "a_timesincethishotkey", "a_titlematchmode", "a_titlematchmodespeed", "a_traymenu", "a_username", "a_wday",
    "a_windelay", "a_windir", "a_workingdir", "a_yday", "a_year", "a_yweek", "a_yyyy", "false", "true", "unset",
];

static BUILTIN_VARIABLES: Lazy<FastHashSet<&'static str>> = Lazy::new(|| {
    let mut set = fast_hash_set_new();
    set.extend(BUILTIN_VARIABLE_NAMES.iter().copied());
    set
});

/// Case-insensitive membership in the builtin variable table.
pub fn is_builtin_variable(name: &str) -> bool {
    BUILTIN_VARIABLES.contains(crate::util::fast_map::name_key(name).as_ref())
}

/// Declarations of the core classes, parsed with the regular parser on first use.
const PRELUDE_SOURCE: &str = r#"
class Object {
    Base := ""
    __Class := ""
    Clone() {
    }
    DefineProp(Name, Desc) {
    }
    DeleteProp(Name) {
    }
    GetOwnPropDesc(Name) {
    }
    HasOwnProp(Name) {
    }
    OwnProps() {
    }
    HasBase(BaseObj) {
    }
    HasMethod(Name, ParamCount := "") {
    }
    HasProp(Name) {
    }
    GetMethod(Name, ParamCount := "") {
    }
}
class Class extends Object {
    Prototype := ""
    static Call() {
    }
}
class Func extends Object {
    Name := ""
    MinParams := 0
    MaxParams := 0
    IsVariadic := 0
    Call(Params*) {
    }
    Bind(Params*) {
    }
    IsByRef(ParamIndex := "") {
    }
    IsOptional(ParamIndex := "") {
    }
}
class Array extends Object {
    Length := 0
    Capacity := 0
    Default := ""
    Clone() => []
    Delete(Index) {
    }
    Get(Index, Default := "") {
    }
    Has(Index) {
    }
    InsertAt(Index, Values*) {
    }
    Pop() {
    }
    Push(Values*) {
    }
    RemoveAt(Index, Length := 1) {
    }
    __Enum(NumberOfVars) {
    }
}
class Map extends Object {
    Count := 0
    Capacity := 0
    CaseSense := "On"
    Default := ""
    Clear() {
    }
    Delete(Key) {
    }
    Get(Key, Default := "") {
    }
    Has(Key) {
    }
    Set(Values*) {
    }
    __Enum(NumberOfVars) {
    }
}
class String extends Object {
    Length := 0
}
class Number extends Object {
}
class Error extends Object {
    Message := ""
    What := ""
    Extra := ""
    File := ""
    Line := 0
    Stack := ""
}
"#;

static PRELUDE: Lazy<Analysis> = Lazy::new(|| Parser::new(PRELUDE_SOURCE, &ParseOptions::default()).parse());

/// The parsed builtin class declarations.
pub fn prelude() -> &'static Analysis {
    &PRELUDE
}
