/// Count the argument slots a method descriptor takes up on the operand stack
///
/// `long` and `double` arguments take two slots, everything else takes one. Returns `None` if the
/// descriptor is malformed.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.3.3
pub fn argument_slots(descriptor: &str) -> Option<u32> {
    let mut chars = descriptor.strip_prefix('(')?.chars();
    let mut slots: u32 = 0;
    loop {
        match chars.next()? {
            ')' => return Some(slots),
            'J' | 'D' => slots = slots.checked_add(2)?,
            'B' | 'C' | 'F' | 'I' | 'S' | 'Z' => slots = slots.checked_add(1)?,
            'L' => {
                chars.find(|c| *c == ';')?;
                slots = slots.checked_add(1)?;
            }
            '[' => {
                let mut element = chars.next()?;
                while element == '[' {
                    element = chars.next()?;
                }
                if element == 'L' {
                    chars.find(|c| *c == ';')?;
                }
                slots = slots.checked_add(1)?;
            }
            _ => return None,
        }
    }
}
