use goto_bf::Interpreter;

fn main() {
    // Print the digits 9 down to 1 using a label loop instead of brackets
    // for the repetition. Cell 0 counts, cell 1 holds the ASCII digit.
    let code = "
        # counter and digit #
        +++++++++ > ++++++++++++++++++++++++++++++++++++++++++++++++ +++++++++ <
        ^l
        > . - <          # print digit then step it down #
        -                # one fewer to go #
        [ vl ]           # jump back to l while the counter is non-zero #
    ";

    let mut interpreter = Interpreter::new(code.to_string());

    if let Err(err) = interpreter.run() {
        eprintln!("interpreter error: {err}");
        std::process::exit(1);
    }

    println!("{}", String::from_utf8_lossy(interpreter.output()));
}
