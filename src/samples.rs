//! Sample assembly programs, ported from the reference's example library —
//! useful as fixtures for tests and as a quick smoke-test corpus for a CLI.

/// Addition: 35 + 120 = 155, stored at address 18.
pub const ADDITION: &str = "
    CLR          ; Clear accumulator
    ADD 16       ; Add contents of address 16
    ADD 17       ; Add contents of address 17
    STR 18       ; Store result in address 18
    HLT          ; Halt

    ORG 16
    DATA 35      ; First number
    DATA 120     ; Second number
    DATA 0       ; Result storage
";

/// Same sum via indirect addressing through pointer cells at 16/17.
pub const INDIRECT: &str = "
    CLR          ; Clear AC
    ADD *16      ; Add indirect from address 16
    ADD *17      ; Add indirect from address 17
    STR 18       ; Store result directly
    HLT          ; Halt

    ORG 16
    DATA 20      ; Points to address 20
    DATA 21      ; Points to address 21
    DATA 0       ; Result storage

    ORG 20
    DATA 35      ; First number
    DATA 120     ; Second number
";

/// Accumulates 1 repeatedly into address 21, looping forever via SNA/JMP.
pub const COUNTER: &str = "
    CLR          ; Clear accumulator
LOOP:
    ADD 20       ; Add 1 (from address 20)
    STR 21       ; Store current count
    SNA          ; Skip the jump once AC is non-zero
    JMP LOOP     ; Continue loop
    HLT

    ORG 20
    DATA 1       ; Increment value
    DATA 0       ; Counter storage
";

/// Minimal device exercise: input from channel 1, output to channel 2.
pub const IO_TEST: &str = "
    CLR          ; Clear AC
    INP 1        ; Input from device 1
    OUT 2        ; Output to device 2
    HLT          ; Halt
";

/// Exercises ORG with deliberate gaps between code and data regions.
pub const ORG_TEST: &str = "
    ORG 0
    CLR          ; Start at address 0
    ADD 50       ; Add from address 50
    STR 100      ; Store at address 100
    HLT

    ORG 50
    DATA 42      ; Some data

    ORG 100
    DATA 0       ; Result storage

    ORG 200
    DATA 99      ; More data
";

/// Polls console input flag and echoes every character to console output.
pub const CONSOLE_ECHO: &str = "
    CLR
LOOP:
    SFG 1        ; Skip if console input ready
    JMP LOOP     ; Wait for input
    INP 1        ; Input character
    OUT 2        ; Echo to output
    JMP LOOP     ; Continue
";

/// Reads the front-panel data switches and mirrors them onto the LEDs.
pub const SWITCH_TEST: &str = "
    CLR
    INP 3        ; Input from data switches
    OUT 4        ; Output to LED display
    HLT
";

/// Copies paper tape contents to the console until the tape runs dry.
pub const PAPER_TAPE_COPY: &str = "
    CLR
LOOP:
    SFG 5        ; Skip if tape ready
    JMP END      ; No more data
    INP 5        ; Read from tape
    OUT 2        ; Output to console
    JMP LOOP     ; Continue
END:
    HLT
";

/// Input complement and display combo: reads a device, complements it via
/// CMP, and mirrors onto the LEDs and console.
pub const COMPLEMENT_DISPLAY: &str = "
    CLR
    INP 3        ; Read data switches
    CMP          ; Complement the value
    OUT 4        ; Display on LEDs
    OUT 2        ; Output to console
    HLT
";

/// All sample programs keyed by name, for a CLI menu or test sweep.
pub fn all() -> Vec<(&'static str, &'static str)> {
    vec![
        ("addition", ADDITION),
        ("indirect", INDIRECT),
        ("counter", COUNTER),
        ("io_test", IO_TEST),
        ("org_test", ORG_TEST),
        ("console_echo", CONSOLE_ECHO),
        ("switch_test", SWITCH_TEST),
        ("paper_tape_copy", PAPER_TAPE_COPY),
        ("complement_display", COMPLEMENT_DISPLAY),
    ]
}
