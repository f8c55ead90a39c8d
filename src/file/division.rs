clamp!(
    /// The time division of a MIDI file in ticks (pulses) per quarter note. SMPTE divisions
    /// are not supported; bit 15 of the written word is therefore always zero. A positive
    /// `u14`, range 1 to 16,383, defaulting to 96.
    QuarterNoteDivision,
    u16,
    1,
    16383,
    96,
    pub
);
