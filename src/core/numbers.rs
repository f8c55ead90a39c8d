// channel is 0-15, displayed to users as 1-16.
clamp!(Channel, u8, 0, 15, 0, pub);

clamp!(NoteNumber, u8, 0, 127, 60, pub);
clamp!(Velocity, u8, 0, 127, 127, pub);
clamp!(Program, u8, 0, 127, 0, pub);
clamp!(U7, u8, 0, 127, 0, pub);

// The controller number of a control change message and its value.
clamp!(Controller, u8, 0, 127, 0, pub);
clamp!(ControlValue, u8, 0, 127, 0, pub);

// 14-bit pitch bend amount, 8192 is centered.
clamp!(PitchBendValue, u16, 0, 16383, 8192, pub);
