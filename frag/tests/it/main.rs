mod end_to_end;
mod hardening;
