//! ASCII art banner for interactive mode.

use std::io::IsTerminal;

/// ANSI true-color escape sequences for the banner palette.
struct Colors {
    node: &'static str,
    link: &'static str,
    title: &'static str,
    subtitle: &'static str,
    reset: &'static str,
}

const COLOR: Colors = Colors {
    node: "\x1b[38;2;232;65;66m",
    link: "\x1b[38;2;120;120;140m",
    title: "\x1b[1;38;2;232;65;66m",
    subtitle: "\x1b[38;2;100;100;120m",
    reset: "\x1b[0m",
};

const PLAIN: Colors = Colors {
    node: "",
    link: "",
    title: "",
    subtitle: "",
    reset: "",
};

/// Prints the ledgersim banner to stdout.
///
/// Renders ANSI true-color when stdout is a terminal and `color` is not
/// forced off, plain text otherwise.
pub fn print_banner(color: Option<bool>) {
    let colored = color.unwrap_or_else(|| std::io::stdout().is_terminal());
    let c = if colored { &COLOR } else { &PLAIN };

    let n = c.node;
    let l = c.link;
    let tt = c.title;
    let st = c.subtitle;
    let r = c.reset;

    println!(
        r#"
{n}    ●{l}───────{n}●{r}        {tt} _          _                     _{r}
{l}    │ ╲   ╱ │{r}        {tt}| | ___  __| | __ _  ___ _ __ ___(_)_ __ ___{r}
{l}    │   {n}●{l}   │{r}        {tt}| |/ _ \/ _` |/ _` |/ _ \ '__/ __| | '_ ` _ \{r}
{l}    │ ╱   ╲ │{r}        {tt}| |  __/ (_| | (_| |  __/ |  \__ \ | | | | | |{r}
{n}    ●{l}───────{n}●{r}        {tt}|_|\___|\__,_|\__, |\___|_|  |___/_|_| |_| |_|{r}
                                      {tt}|___/{r}
                    {st}five nodes, one machine, zero persistence{r}
"#
    );
}
