pub struct Scaler {
    context: ffmpeg_next::software::scaling::Context,
}

impl Scaler {
    pub fn new(context: ffmpeg_next::software::scaling::Context) -> Self {
        Self { context }
    }

    pub fn run(
        &mut self,
        frame: &ffmpeg_next::frame::Video,
        dst: &mut ffmpeg_next::frame::Video,
    ) -> Result<(), ffmpeg_next::Error> {
        self.context.run(frame, dst)
    }
}
